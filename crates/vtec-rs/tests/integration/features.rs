//! Product-level features: upgrades, corrections, routine and UFN products.

use vtec_rs::core::{Action, Etn};

use crate::fixtures::{lines, run_script};

#[test]
fn upgrade_closes_advisory_and_opens_warning() {
    let (runner, outcomes) = run_script("upgrade.toml");
    assert_eq!(
        lines(&outcomes[1]),
        vec![
            "/O.UPG.KTBW.WI.Y.0001.000000T0000Z-100101T1200Z/",
            "/O.NEW.KTBW.HW.W.0001.100101T0200Z-100101T1200Z/",
        ]
    );
    // Both products share the single zone block.
    assert_eq!(outcomes[1].product.matches("FLZ039-").count(), 1);
    assert_eq!(runner.table().len(), 3);
}

#[test]
fn correction_carries_previous_action() {
    let (_, outcomes) = run_script("correction.toml");
    let cor = &outcomes[1].segments[0];
    assert_eq!(cor.action, Action::Cor);
    assert_eq!(cor.prev_action, Some(Action::New));
}

#[test]
fn routine_products_are_not_tracked() {
    let (runner, outcomes) = run_script("routine.toml");
    assert_eq!(outcomes[0].segments[0].etn, Etn::ROUTINE);
    assert_eq!(outcomes[0].committed, 0);
    assert!(runner.table().is_empty());
    assert!(runner.pool().is_empty());
}

#[test]
fn until_further_notice_renders_zero_end() {
    let (runner, outcomes) = run_script("until_further_notice.toml");
    assert!(outcomes.iter().all(|o| o.segments.iter().all(|s| s.ufn)));
    assert!(outcomes[0].segments[0].end.is_ufn());
    assert_eq!(outcomes[2].segments[0].action, Action::Can);
    assert_eq!(runner.table().len(), 3);
}
