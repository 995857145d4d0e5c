//! Property tests for the sector-avoidance policy.

use avoid_core::AvoidError;
use avoid_library::prelude::*;
use proptest::prelude::*;

const RANGE_MAX: f32 = 3.5;

fn reading() -> impl Strategy<Value = f32> {
    prop_oneof![
        8 => 0.0f32..5.0,
        1 => Just(f32::INFINITY),
        1 => Just(f32::NEG_INFINITY),
        1 => Just(f32::NAN),
        1 => Just(0.4f32),
    ]
}

fn readings() -> impl Strategy<Value = [f32; 5]> {
    proptest::array::uniform5(reading())
}

fn allowed(cmd: VelocityCommand) -> bool {
    matches!(
        (cmd.linear, cmd.angular),
        (l, a) if (l == 0.2 && a == 0.0) || (l == 0.0 && (a == 0.5 || a == -0.5))
    )
}

proptest! {
    /// Identical readings always produce bit-identical commands.
    #[test]
    fn command_is_deterministic(d in readings()) {
        let policy = SectorAvoidancePolicy::default();
        let r = SectorReadings::from_distances(d, RANGE_MAX);
        let a = policy.command(&r);
        let b = policy.command(&r);
        prop_assert_eq!(a.linear.to_bits(), b.linear.to_bits());
        prop_assert_eq!(a.angular.to_bits(), b.angular.to_bits());
    }

    /// Output is always one of the four motions, and only forward motion
    /// has a linear component.
    #[test]
    fn command_is_one_of_four_motions(d in readings()) {
        let cmd = SectorAvoidancePolicy::default().command(&SectorReadings::from_distances(d, RANGE_MAX));
        prop_assert!(allowed(cmd), "unexpected command {:?}", cmd);
    }

    /// Extracted distances are always finite.
    #[test]
    fn readings_are_finite(d in readings()) {
        let r = SectorReadings::from_distances(d, RANGE_MAX);
        prop_assert!(r.samples().iter().all(|s| s.distance.is_finite()));
    }

    /// A non-finite sample in any slot decides exactly like one at `range_max`.
    #[test]
    fn non_finite_matches_range_max(
        d in readings(),
        slot in 0usize..5,
        bad in prop_oneof![Just(f32::INFINITY), Just(f32::NEG_INFINITY), Just(f32::NAN)],
    ) {
        let policy = SectorAvoidancePolicy::default();
        let mut with_bad = d;
        with_bad[slot] = bad;
        let mut with_max = d;
        with_max[slot] = RANGE_MAX;

        let bad_readings = SectorReadings::from_distances(with_bad, RANGE_MAX);
        prop_assert_eq!(bad_readings.samples()[slot].distance, RANGE_MAX);
        prop_assert_eq!(
            policy.decide(&bad_readings),
            policy.decide(&SectorReadings::from_distances(with_max, RANGE_MAX))
        );
    }

    /// A blocked front always stops forward motion.
    #[test]
    fn blocked_front_never_moves_forward(d in readings(), front in 0.0f32..0.4) {
        let mut d = d;
        d[0] = front;
        let policy = SectorAvoidancePolicy::default();
        let r = SectorReadings::from_distances(d, RANGE_MAX);
        prop_assert!(matches!(policy.decide(&r), Decision::FrontBlocked { .. }), "expected FrontBlocked");
        prop_assert_eq!(policy.command(&r).linear, 0.0);
    }

    /// Forward motion only happens when nothing is strictly inside the threshold.
    #[test]
    fn forward_only_when_clear(d in readings()) {
        let policy = SectorAvoidancePolicy::default();
        let r = SectorReadings::from_distances(d, RANGE_MAX);
        if policy.command(&r).linear > 0.0 {
            prop_assert!(r.samples().iter().all(|s| s.distance >= 0.4));
        }
    }

    /// Only the five sampled beams influence the decision.
    #[test]
    fn unsampled_beams_are_ignored(noise in proptest::collection::vec(0.0f32..5.0, 360)) {
        let mut scan = LaserScan::with_ranges(noise, RANGE_MAX);
        for i in [0, 30, 60, 300, 330] {
            scan.ranges[i] = 1.0;
        }
        let readings = SectorReadings::extract(&scan, &SectorLayout::default()).unwrap();
        let cmd = SectorAvoidancePolicy::default().command(&readings);
        prop_assert_eq!((cmd.linear, cmd.angular), (0.2, 0.0));
    }

    /// Scans shorter than 331 beams are always rejected, never indexed.
    #[test]
    fn short_scans_are_malformed(len in 0usize..331) {
        let scan = LaserScan::with_ranges(vec![1.0; len], RANGE_MAX);
        let is_malformed = matches!(
            SectorReadings::extract(&scan, &SectorLayout::default()),
            Err(AvoidError::MalformedScan { required: 331, .. })
        );
        prop_assert!(is_malformed);
    }
}
