//! Multi-step issuance scenarios driven from the bundled scripts.

use vtec_rs::core::{Action, ActiveTable, Etn, EtnKey, PhenSig};

use crate::fixtures::{lines, office, run_script};

fn ps(raw: &str) -> PhenSig {
    PhenSig::parse(raw).expect("phen/sig")
}

#[test]
fn year_crossing_restarts_numbering() {
    let (runner, outcomes) = run_script("s1_year_crossing.toml");
    assert_eq!(outcomes.len(), 4);
    assert_eq!(
        lines(&outcomes[0]),
        vec![
            "/O.NEW.KTBW.DU.Y.0002.091231T0600Z-091231T1800Z/",
            "/O.NEW.KTBW.DU.Y.0001.091230T1200Z-091231T0000Z/",
        ]
    );

    let pool = runner.pool();
    let du = ps("DU.Y");
    assert_eq!(
        pool.highest(&EtnKey::new(&office(), du, 2009)),
        Some(Etn::new(2).unwrap())
    );
    assert_eq!(
        pool.highest(&EtnKey::new(&office(), du, 2010)),
        Some(Etn::new(1).unwrap())
    );
    assert!(outcomes[3].segments.is_empty());
}

#[test]
fn watch_split_by_warning_then_absorbed() {
    let (runner, outcomes) = run_script("s3_watch_to_warning.toml");
    let last = &outcomes[2];
    let actions: Vec<Action> = last.segments.iter().map(|s| s.action).collect();
    assert_eq!(actions, vec![Action::Can, Action::Con, Action::Ext]);

    // The cancelled watch no longer shows up; the second watch and the warning do.
    let at = last.issue_time;
    assert!(
        runner
            .table()
            .query(&office(), ps("WS.A"), at)
            .iter()
            .all(|r| r.etn == Etn::new(2).unwrap())
    );
    assert_eq!(runner.table().query(&office(), ps("WS.W"), at).len(), 2);
}

#[test]
fn area_expansion_keeps_event_numbers() {
    let (_, outcomes) = run_script("s4_area_expansion.toml");
    // First product: one event spanning two zone groups.
    assert!(outcomes[0].segments.iter().all(|s| s.etn == Etn::FIRST));
    assert_eq!(outcomes[0].segments.len(), 2);
    // Second product adds exactly one new event.
    let new: Vec<_> = outcomes[1]
        .segments
        .iter()
        .filter(|s| s.action == Action::New)
        .collect();
    assert_eq!(new.len(), 1);
    assert_eq!(new[0].etn, Etn::new(2).unwrap());
}

#[test]
fn storm_events_each_get_their_own_number() {
    let (runner, outcomes) = run_script("s5_storm_events.toml");
    let second = &outcomes[1];
    let by_event: Vec<(Option<&str>, u16)> = second
        .segments
        .iter()
        .map(|s| (s.event_id.as_ref().map(|id| id.as_str()), s.etn.get()))
        .collect();
    assert_eq!(by_event, vec![(Some("storm-2"), 2), (Some("storm-1"), 1)]);
    assert_eq!(
        runner
            .table()
            .query(&office(), ps("TO.W"), second.issue_time)
            .len(),
        2
    );
}

#[test]
fn reentrant_zone_gets_a_fresh_event() {
    let (_, outcomes) = run_script("s6_reentrant_zone.toml");
    let product = &outcomes[0].product;
    assert_eq!(product.matches("GMZ850-").count(), 1);
    assert_eq!(product.matches("$$").count(), 2);
    assert_eq!(outcomes[0].committed, 3);
}
