use plume_common::{
    CastInterval, ConfigError, FlyMode, OdorProbabilities, OdorSource, OdorThresholds, SwarmParams, Vec2,
};
use plume_swarm::{
    ConstantWindField, DiffusionOdorField, DiffusionOdorParams, OdorField, Swarm, TrapHit, TrapRecord,
};
use rand::prelude::*;
use std::f64::consts::{FRAC_PI_2, PI};

/// Odor field whose concentration is an arbitrary function of time and
/// position, with traps at fixed points.
struct ScriptedOdor<F> {
    level: F,
    traps: Vec<Vec2>,
    radius: f64,
}

impl<F: Fn(f64, Vec2) -> f64> OdorField for ScriptedOdor<F> {
    fn value(&self, t: f64, points: &[Vec2]) -> Vec<f64> {
        points.iter().map(|&p| (self.level)(t, p)).collect()
    }

    fn check_if_in_trap(&self, position: Vec2) -> Option<TrapHit> {
        self.traps
            .iter()
            .enumerate()
            .find(|(_, &loc)| position.distance(loc) <= self.radius)
            .map(|(index, &location)| TrapHit { index, location })
    }

    fn trap_count(&self) -> usize {
        self.traps.len()
    }
}

fn scripted<F: Fn(f64, Vec2) -> f64>(level: F) -> ScriptedOdor<F> {
    ScriptedOdor { level, traps: Vec::new(), radius: 0.0 }
}

fn params(size: usize) -> SwarmParams {
    SwarmParams {
        initial_heading: vec![FRAC_PI_2; size],
        x_start_position: vec![0.0; size],
        y_start_position: vec![0.0; size],
        flight_speed: vec![1.0; size],
        release_time: vec![0.0; size],
        heading_error_std: 0.0,
        cast_interval: CastInterval { min: 3.0, max: 3.0 },
        wind_slippage: 0.0,
        odor_thresholds: OdorThresholds { lower: 0.1, upper: 0.5 },
        odor_probabilities: OdorProbabilities { lower: 1.0, upper: 1.0 },
    }
}

fn swarm(params: SwarmParams, seed: u64) -> Swarm {
    Swarm::new(params, StdRng::seed_from_u64(seed)).unwrap()
}

#[test]
fn unreleased_flies_stay_put() {
    let mut p = params(4);
    p.release_time = vec![0.0, 50.0, 50.0, 0.0];
    p.x_start_position = vec![0.0, 1.0, 2.0, 3.0];
    let mut swarm = swarm(p, 1);
    let wind = ConstantWindField::new(0.0, 1.0);
    let odor = scripted(|_, _| 1.0);

    let start_positions = swarm.positions().to_vec();
    let start_velocities = swarm.velocities().to_vec();

    for step in 0..=50 {
        swarm.update(step as f64, 1.0, &wind, &odor);
    }

    for i in [1, 2] {
        assert_eq!(swarm.positions()[i], start_positions[i]);
        assert_eq!(swarm.velocities()[i], start_velocities[i]);
        assert_eq!(swarm.modes()[i], FlyMode::FixHeading);
    }
    for i in [0, 3] {
        assert_ne!(swarm.positions()[i], start_positions[i]);
        assert_eq!(swarm.modes()[i], FlyMode::FlyUpwind);
    }
    assert_eq!(swarm.released_count(50.0), 2);
    assert_eq!(swarm.released_count(50.5), 4);
}

#[test]
fn detection_turns_flies_upwind() {
    let mut p = params(1);
    p.x_start_position = vec![10.0];
    let mut swarm = swarm(p, 2);
    let wind = ConstantWindField::new(0.0, 2.0);

    swarm.update(1.0, 0.5, &wind, &scripted(|_, _| 1.0));

    assert_eq!(swarm.modes()[0], FlyMode::FlyUpwind);
    assert_eq!(swarm.velocities()[0], Vec2::new(-1.0, 0.0));
    assert_eq!(swarm.positions()[0], Vec2::new(9.5, 0.0));
}

#[test]
fn no_detection_below_threshold_or_without_probability() {
    let wind = ConstantWindField::new(0.0, 1.0);

    let mut below = swarm(params(3), 3);
    let mut never = {
        let mut p = params(3);
        p.odor_probabilities.upper = 0.0;
        swarm(p, 3)
    };
    for step in 1..=100 {
        below.update(step as f64, 1.0, &wind, &scripted(|_, _| 0.4));
        never.update(step as f64, 1.0, &wind, &scripted(|_, _| 1.0));
    }

    assert!(below.modes().iter().all(|&m| m == FlyMode::FixHeading));
    assert!(never.modes().iter().all(|&m| m == FlyMode::FixHeading));
}

#[test]
fn losing_odor_starts_a_cast_and_casts_flip_on_schedule() {
    let mut swarm = swarm(params(1), 4);
    // Wind toward +y so the crosswind sign flip shows up in the sweep.
    let wind = ConstantWindField::new(FRAC_PI_2, 1.0);
    let odor = scripted(|t, _| if t < 5.0 { 1.0 } else { 0.0 });

    for step in 1..=4 {
        swarm.update(step as f64, 1.0, &wind, &odor);
    }
    assert_eq!(swarm.modes()[0], FlyMode::FlyUpwind);

    swarm.update(5.0, 1.0, &wind, &odor);
    let state = swarm.state();
    assert_eq!(state.modes[0], FlyMode::CastForOdor);
    assert_eq!(state.t_last_cast[0], 5.0);
    assert_eq!(state.dt_next_cast[0], 3.0);
    let sign = state.cast_sign[0];
    assert!(sign == 1.0 || sign == -1.0);
    let v = state.velocities[0];
    assert!(v.x.abs() < 1e-12);
    assert!((v.y + sign).abs() < 1e-12);

    // The cast ends strictly after t_last_cast + dt_next_cast.
    for step in 6..=8 {
        swarm.update(step as f64, 1.0, &wind, &odor);
    }
    assert_eq!(swarm.state().t_last_cast[0], 5.0);

    swarm.update(9.0, 1.0, &wind, &odor);
    assert_eq!(swarm.state().t_last_cast[0], 9.0);
    assert_eq!(swarm.modes()[0], FlyMode::CastForOdor);
    assert!((swarm.velocities()[0].length() - 1.0).abs() < 1e-12);
}

#[test]
fn casting_fly_that_detects_odor_is_not_recast() {
    let mut p = params(1);
    p.cast_interval = CastInterval { min: 0.0, max: 0.0 };
    let mut swarm = swarm(p, 5);
    let wind = ConstantWindField::new(0.0, 1.0);
    let odor = scripted(|t, _| if (3.0..6.0).contains(&t) { 0.0 } else { 1.0 });

    for step in 1..=5 {
        swarm.update(step as f64, 1.0, &wind, &odor);
    }
    assert_eq!(swarm.modes()[0], FlyMode::CastForOdor);
    assert_eq!(swarm.state().t_last_cast[0], 5.0);

    swarm.update(6.0, 1.0, &wind, &odor);
    assert_eq!(swarm.modes()[0], FlyMode::FlyUpwind);
    assert_eq!(swarm.velocities()[0], Vec2::new(-1.0, 0.0));
    assert_eq!(swarm.state().t_last_cast[0], 5.0);
}

#[test]
fn heading_error_is_drawn_only_on_mode_entry() {
    let mut p = params(1);
    p.flight_speed = vec![1.5];
    p.heading_error_std = 0.3;
    p.cast_interval = CastInterval { min: 100.0, max: 100.0 };
    let mut swarm = swarm(p, 11);
    let wind = ConstantWindField::new(0.4, 2.0);
    let wind_unit = wind.velocity().normalize_or_zero();
    let odor = scripted(|t, _| if t < 10.0 { 1.0 } else { 0.0 });

    swarm.update(1.0, 1.0, &wind, &odor);
    assert_eq!(swarm.modes()[0], FlyMode::FlyUpwind);
    let upwind_error = swarm.state().heading_error[0];
    assert_ne!(upwind_error, 0.0);
    let expected = -(wind_unit.rotate(upwind_error) * 1.5);
    assert!(swarm.velocities()[0].distance(expected) < 1e-12);
    let upwind_velocity = swarm.velocities()[0];

    for step in 2..=9 {
        swarm.update(step as f64, 1.0, &wind, &odor);
        assert_eq!(swarm.modes()[0], FlyMode::FlyUpwind);
        assert_eq!(swarm.state().heading_error[0].to_bits(), upwind_error.to_bits());
        assert_eq!(swarm.velocities()[0], upwind_velocity);
    }

    swarm.update(10.0, 1.0, &wind, &odor);
    assert_eq!(swarm.modes()[0], FlyMode::CastForOdor);
    let cast_error = swarm.state().heading_error[0];
    assert_ne!(cast_error.to_bits(), upwind_error.to_bits());
    let sign = swarm.state().cast_sign[0];
    let sweep = Vec2::new(wind_unit.x, -wind_unit.y).rotate(cast_error) * (sign * 1.5);
    assert!(swarm.velocities()[0].distance(sweep) < 1e-12);

    for step in 11..=20 {
        swarm.update(step as f64, 1.0, &wind, &odor);
        assert_eq!(swarm.modes()[0], FlyMode::CastForOdor);
        assert_eq!(swarm.state().heading_error[0].to_bits(), cast_error.to_bits());
    }
}

#[test]
fn modes_set_this_step_do_not_feed_later_transitions() {
    // With equal thresholds a fly reading exactly the threshold qualifies for
    // both detection and loss; only the mode it started the step in counts.
    let mut p = params(5);
    p.odor_thresholds = OdorThresholds { lower: 0.5, upper: 0.5 };
    p.odor_probabilities = OdorProbabilities { lower: 1.0, upper: 1.0 };
    let mut swarm = swarm(p, 12);
    let wind = ConstantWindField::new(0.0, 1.0);
    let odor = scripted(|_, _| 0.5);

    swarm.update(1.0, 1.0, &wind, &odor);
    assert!(swarm.modes().iter().all(|&m| m == FlyMode::FlyUpwind));

    swarm.update(2.0, 1.0, &wind, &odor);
    assert!(swarm.modes().iter().all(|&m| m == FlyMode::CastForOdor));

    swarm.update(3.0, 1.0, &wind, &odor);
    assert!(swarm.modes().iter().all(|&m| m == FlyMode::FlyUpwind));
}

#[test]
fn trapped_flies_never_change() {
    let mut swarm = swarm(params(1), 6);
    let wind = ConstantWindField::new(0.0, 1.0);
    let odor = ScriptedOdor {
        level: |_: f64, _: Vec2| 0.0,
        traps: vec![Vec2::new(0.0, 5.0)],
        radius: 1.5,
    };

    for step in 1..=5 {
        swarm.update(step as f64, 1.0, &wind, &odor);
    }
    assert_eq!(swarm.modes()[0], FlyMode::Trapped);
    let caught_at = swarm.positions()[0];
    assert!((caught_at.y - 4.0).abs() < 1e-12);

    for step in 6..=30 {
        swarm.update(step as f64, 1.0, &wind, &odor);
        assert_eq!(swarm.modes()[0], FlyMode::Trapped);
        assert_eq!(swarm.positions()[0], caught_at);
        assert_eq!(swarm.velocities()[0], Vec2::zero());
    }

    assert_eq!(
        swarm.trap_records()[0],
        Some(TrapRecord { trap_num: 0, location: Vec2::new(0.0, 5.0), time: 5.0 })
    );
    assert_eq!(swarm.trap_counts(1), vec![1]);
    assert_eq!(swarm.trap_nums(), vec![0]);
    assert_eq!(swarm.times_trapped(Some(0)), vec![5.0]);
    assert!(swarm.times_trapped(Some(1)).is_empty());
    assert_eq!(swarm.mode_counts().trapped, 1);
}

#[test]
fn wind_slippage_adds_drift() {
    let mut p = params(1);
    p.flight_speed = vec![0.0];
    p.wind_slippage = 0.5;
    let mut swarm = swarm(p, 7);
    let wind = ConstantWindField::new(0.0, 2.0);

    swarm.update(1.0, 1.0, &wind, &scripted(|_, _| 0.0));
    assert_eq!(swarm.positions()[0], Vec2::new(1.0, 0.0));
}

#[test]
fn fly_tracks_plume_upwind_into_trap() {
    let mut p = params(1);
    p.x_start_position = vec![100.0];
    p.odor_thresholds = OdorThresholds { lower: 0.0, upper: 1e-6 };
    p.odor_probabilities = OdorProbabilities { lower: 0.0, upper: 1.0 };
    let mut swarm = swarm(p, 8);

    let wind = ConstantWindField::new(0.0, 1.0);
    let odor = DiffusionOdorField::new(
        wind,
        DiffusionOdorParams {
            diffusion_coeff: 0.25,
            sources: vec![OdorSource::new(Vec2::zero(), 10.0)],
            epsilon: 0.01,
            trap_radius: 5.0,
        },
    )
    .unwrap();
    assert!(odor.value(0.0, swarm.positions())[0] > 1e-6);

    let mut prev_x = swarm.positions()[0].x;
    let mut upwind_steps = 0;
    for step in 1..=200 {
        swarm.update(step as f64, 1.0, &wind, &odor);
        match swarm.modes()[0] {
            FlyMode::FlyUpwind => {
                upwind_steps += 1;
                assert!(swarm.positions()[0].x < prev_x, "step {step} did not move upwind");
            }
            FlyMode::Trapped => break,
            other => panic!("unexpected mode {other:?} at step {step}"),
        }
        prev_x = swarm.positions()[0].x;
    }

    assert_eq!(upwind_steps, 95);
    assert_eq!(swarm.modes()[0], FlyMode::Trapped);
    assert_eq!(swarm.positions()[0], Vec2::new(5.0, 0.0));
    assert_eq!(
        swarm.trap_records()[0],
        Some(TrapRecord { trap_num: 0, location: Vec2::zero(), time: 96.0 })
    );
}

#[test]
fn seeded_runs_are_bit_identical() {
    let size = 300;
    let mut setup = StdRng::seed_from_u64(99);
    let mut p = params(size);
    p.initial_heading = (0..size).map(|_| setup.random_range(0.0..2.0 * PI)).collect();
    p.release_time = (0..size).map(|_| setup.random_range(0.0..50.0)).collect();
    p.flight_speed = vec![0.7; size];
    p.heading_error_std = 10f64.to_radians();
    p.cast_interval = CastInterval { min: 5.0, max: 40.0 };
    p.wind_slippage = 0.1;
    p.odor_thresholds = OdorThresholds { lower: 0.002, upper: 0.004 };
    p.odor_probabilities = OdorProbabilities { lower: 0.9, upper: 0.5 };

    let wind = ConstantWindField::new(25f64.to_radians(), 0.5);
    let odor = DiffusionOdorField::new(
        wind,
        DiffusionOdorParams {
            diffusion_coeff: 0.25,
            sources: plume_common::create_circle_of_sources(6, 200.0, 10.0),
            epsilon: 0.01,
            trap_radius: 20.0,
        },
    )
    .unwrap();

    let run = |seed: u64| {
        let mut swarm = swarm(p.clone(), seed);
        for step in 0..2000 {
            swarm.update(step as f64 * 0.25, 0.25, &wind, &odor);
        }
        swarm
    };

    let a = run(1234);
    let b = run(1234);
    assert_eq!(a.positions(), b.positions());
    assert_eq!(a.velocities(), b.velocities());
    assert_eq!(a.modes(), b.modes());
    assert_eq!(a.trap_records(), b.trap_records());
}

#[test]
fn ineligible_flies_do_not_consume_random_draws() {
    let mut p = params(2);
    p.initial_heading = vec![0.0, PI];
    p.x_start_position = vec![0.0, -1000.0];
    p.flight_speed = vec![0.5, 0.5];
    p.heading_error_std = 0.2;
    p.cast_interval = CastInterval { min: 2.0, max: 6.0 };
    p.odor_probabilities = OdorProbabilities { lower: 0.3, upper: 0.3 };

    // Fly 1 is never eligible for anything: unreleased in one run, released
    // but far from any odor in the other.
    let mut unreleased = p.clone();
    unreleased.release_time = vec![0.0, 1e9];

    let wind = ConstantWindField::new(0.0, 1.0);
    let odor = scripted(|t: f64, pos: Vec2| {
        if pos.x > -50.0 && (t as i64 / 20) % 2 == 0 {
            1.0
        } else {
            0.0
        }
    });

    let mut a = swarm(p, 77);
    let mut b = swarm(unreleased, 77);
    for step in 0..400 {
        let t = step as f64 * 0.5;
        a.update(t, 0.5, &wind, &odor);
        b.update(t, 0.5, &wind, &odor);
        assert_eq!(a.positions()[0], b.positions()[0], "diverged at t={t}");
        assert_eq!(a.modes()[0], b.modes()[0]);
    }
    assert_eq!(a.modes()[1], FlyMode::FixHeading);
}

#[test]
fn construction_rejects_mismatched_arrays() {
    let mut p = params(3);
    p.flight_speed = vec![1.0, 1.0];
    let err = Swarm::new(p, StdRng::seed_from_u64(0)).err();
    assert_eq!(
        err,
        Some(ConfigError::ShapeMismatch { field: "flight_speed", expected: 3, actual: 2 })
    );
}
