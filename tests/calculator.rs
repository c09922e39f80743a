use gagsolve::{
    explain, health, ko_probability, total_damage, trace, AccuracyOptions, CalcError, GagCatalog, GagError,
    GagInstance, GagKey, TargetStatus, Track,
};

fn gag(track: Track, level: u8, name: &str) -> GagInstance {
    GagCatalog::standard()
        .instance(&GagKey::new(track, level, name))
        .unwrap()
}

fn combos() -> Vec<Vec<GagInstance>> {
    vec![
        vec![gag(Track::Lure, 5, "$10 Bill"), gag(Track::Drop, 6, "Grand Piano")],
        vec![
            gag(Track::Trap, 6, "TNT"),
            gag(Track::Lure, 5, "$10 Bill"),
            gag(Track::Squirt, 5, "Fire Hose"),
        ],
        vec![
            gag(Track::Sound, 6, "Foghorn"),
            gag(Track::Throw, 6, "Birthday Cake").organic(),
            gag(Track::Throw, 5, "Whole Cream Pie"),
            gag(Track::Drop, 5, "Safe"),
        ],
        vec![
            gag(Track::Lure, 2, "Small Magnet"),
            gag(Track::Lure, 1, "$1 Bill"),
            gag(Track::Throw, 4, "Whole Fruit Pie"),
            gag(Track::Squirt, 4, "Seltzer Bottle"),
        ],
        vec![gag(Track::ToonUp, 3, "Lipstick")],
        vec![
            gag(Track::Trap, 2, "Rake"),
            gag(Track::Trap, 5, "Trapdoor"),
            gag(Track::Lure, 5, "$10 Bill"),
        ],
    ]
}

#[test]
fn health_table() {
    for level in 1..=11 {
        assert_eq!(health(level).unwrap(), (level + 1) * (level + 2));
    }
    for level in 12..=20 {
        assert_eq!(health(level).unwrap(), (level + 1) * (level + 2) + 14);
    }
    assert_eq!(health(0), Err(CalcError::InvalidLevel { level: 0 }));
}

#[test]
fn damage_ignores_input_order() {
    for combo in combos() {
        let expected = total_damage(&combo, TargetStatus::default());
        for shift in 1..combo.len() {
            let mut rotated = combo.clone();
            rotated.rotate_left(shift);
            assert_eq!(total_damage(&rotated, TargetStatus::default()), expected);
        }
        let reversed: Vec<GagInstance> = combo.iter().rev().cloned().collect();
        assert_eq!(total_damage(&reversed, TargetStatus::default()), expected);
    }
}

#[test]
fn two_traps_resolve_to_the_same_live_trap() {
    let rake = gag(Track::Trap, 2, "Rake");
    let trapdoor = gag(Track::Trap, 5, "Trapdoor");
    let lure = gag(Track::Lure, 5, "$10 Bill");
    let a = [rake.clone(), trapdoor.clone(), lure.clone()];
    let b = [trapdoor, rake, lure];
    let expected = total_damage(&a, TargetStatus::default());
    assert_eq!(expected.total_damage, 20);
    assert_eq!(total_damage(&b, TargetStatus::default()), expected);
}

#[test]
fn probability_stays_in_unit_interval() {
    for combo in combos() {
        for level in 1..=20 {
            for opts in [AccuracyOptions::default(), AccuracyOptions::lured()] {
                let p = ko_probability(&combo, Some(level), &opts).unwrap();
                assert!((0.0..=1.0).contains(&p), "level {level}: {p}");
            }
        }
    }
}

#[test]
fn probability_ignores_input_order() {
    for combo in combos() {
        let expected = ko_probability(&combo, Some(8), &AccuracyOptions::default()).unwrap();
        let reversed: Vec<GagInstance> = combo.iter().rev().cloned().collect();
        let p = ko_probability(&reversed, Some(8), &AccuracyOptions::default()).unwrap();
        assert!((p - expected).abs() < 1e-12);
    }
}

#[test]
fn trace_and_scalar_agree() {
    for combo in combos() {
        for level in [1, 6, 12] {
            let opts = AccuracyOptions::default();
            let p = ko_probability(&combo, Some(level), &opts).unwrap();
            let t = trace(&combo, Some(level), &opts).unwrap();
            assert_eq!(t.probability().to_bits(), p.to_bits());
        }
    }
}

#[test]
fn empty_selection() {
    assert!(ko_probability(&[], Some(5), &AccuracyOptions::default()).unwrap().abs() < f64::EPSILON);
    assert_eq!(explain(&[], Some(5), &AccuracyOptions::default()).unwrap(), "No gags selected.");
}

#[test]
fn invalid_level_propagates() {
    let combo = vec![gag(Track::Throw, 1, "Cupcake")];
    let err = ko_probability(&combo, Some(0), &AccuracyOptions::default()).unwrap_err();
    assert!(matches!(err, GagError::Calc(CalcError::InvalidLevel { level: 0 })));
}

#[test]
fn explanation_mentions_every_track() {
    let combo = &combos()[2];
    let text = explain(combo, Some(9), &AccuracyOptions::default()).unwrap();
    assert!(text.starts_with("One-turn KO probability:"));
    for track in ["Sound", "Throw", "Drop"] {
        assert!(text.contains(track), "missing {track}");
    }
}
