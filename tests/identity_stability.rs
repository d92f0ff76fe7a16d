// tests/identity_stability.rs
use keyword_sentinel::ingest::{dedup_items, item_identity};
use keyword_sentinel::{CandidateItem, IdentityBasis};
use std::collections::HashSet;

#[test]
fn same_item_across_runs_keeps_identity() {
    let run1 = CandidateItem::new(
        "Доступный Большой — специальные показы",
        "https://bolshoi.ru/about/press/x",
        "12 марта Доступный Большой — специальные показы",
    );
    let run2 = CandidateItem::new(
        "  доступный   БОЛЬШОЙ — специальные\nпоказы ",
        "https://bolshoi.ru/about/press/x ",
        "совсем другой текст вокруг",
    );
    assert_eq!(
        item_identity(&run1, IdentityBasis::TitleLink),
        item_identity(&run2, IdentityBasis::TitleLink)
    );
}

#[test]
fn changed_salient_field_changes_identity() {
    let a = CandidateItem::new("Доступный Большой — показы", "https://bolshoi.ru/a", "");
    let b = CandidateItem::new("Доступный Большой — показы", "https://bolshoi.ru/b", "");
    assert_ne!(
        item_identity(&a, IdentityBasis::TitleLink),
        item_identity(&b, IdentityBasis::TitleLink)
    );
}

#[test]
fn dedup_output_has_pairwise_distinct_identities() {
    let raw: Vec<CandidateItem> = ["Alpha news item", "alpha NEWS item", "Beta news item", "Alpha news item"]
        .iter()
        .map(|t| CandidateItem::new(*t, "/same", *t))
        .collect();
    for basis in [
        IdentityBasis::TitleLink,
        IdentityBasis::Content,
        IdentityBasis::TitleContent,
    ] {
        let n = raw.len();
        let (unique, dropped) = dedup_items(raw.clone(), basis);
        assert_eq!(unique.len() + dropped, n);
        assert_eq!(unique.len(), 2);
        let ids: HashSet<_> = unique.iter().map(|u| u.identity.clone()).collect();
        assert_eq!(ids.len(), unique.len());
    }
}
