//! OakDB Rust SDK - Criteria Chain Tests

use oakdb::query::Criteria;
use oakdb::Error;
use serde_json::json;

#[test]
fn test_negation_lookup_table() {
    let cases: Vec<(Criteria, &str)> = vec![
        (Criteria::of("a").not().equal_to("foo"), r#"a != "foo""#),
        (Criteria::of("a").not().greater_than(1), "a <= 1"),
        (Criteria::of("a").not().greater_than_or_equal(1), "a < 1"),
        (Criteria::of("a").not().less_than(1), "a >= 1"),
        (Criteria::of("a").not().less_than_or_equal(1), "a > 1"),
        (Criteria::of("a").not().like("b%"), r#"a NOT LIKE "b%""#),
        (
            Criteria::of("a").not().contains("b"),
            r#"a NOT CONTAINS "b""#,
        ),
        (
            Criteria::of("a").not().within(json!([1, 2])),
            "a NOT IN [1,2]",
        ),
        (
            Criteria::of("a").not().between(json!([1, 2])),
            "a NOT BETWEEN 1 AND 2",
        ),
        (Criteria::of("g").not().is_null(), "g IS NOT NULL"),
        (Criteria::of("g").not().is_missing(), "g IS NOT MISSING"),
        (Criteria::of("g").not().is_valued(), "g IS NOT VALUED"),
    ];
    for (criteria, expected) in cases {
        assert_eq!(criteria.render().unwrap(), expected);
    }
}

#[test]
fn test_positive_operators() {
    assert_eq!(
        Criteria::of("a").equal_to("foo").render().unwrap(),
        r#"a = "foo""#
    );
    assert_eq!(Criteria::of("g").is_null().render().unwrap(), "g IS NULL");
    assert_eq!(
        Criteria::of("tags").within(json!(["ale", "ipa"])).render().unwrap(),
        r#"tags IN ["ale","ipa"]"#
    );
}

#[test]
fn test_chain_preserves_insertion_order() {
    let criteria = Criteria::of("a")
        .equal_to(1)
        .and("b")
        .equal_to(2)
        .and("c")
        .equal_to(3);
    assert_eq!(criteria.render().unwrap(), "a = 1 AND b = 2 AND c = 3");
}

#[test]
fn test_mixed_chain() {
    let criteria = Criteria::of("type")
        .equal_to("ale")
        .and("abv")
        .between(json!([4.5, 7.0]))
        .and("discontinued")
        .not()
        .is_valued();
    assert_eq!(
        criteria.render().unwrap(),
        r#"type = "ale" AND abv BETWEEN 4.5 AND 7.0 AND discontinued IS NOT VALUED"#
    );
}

#[test]
fn test_between_validates_arity_at_render_not_construction() {
    // Construction must succeed even with the wrong shape.
    let too_many = Criteria::of("abv").between(json!([1, 2, 3]));
    let too_few = Criteria::of("abv").between(json!([1]));
    let not_array = Criteria::of("abv").between("4-6");

    for criteria in [too_many, too_few, not_array] {
        assert!(matches!(
            criteria.render(),
            Err(Error::InvalidArgument(_))
        ));
    }
}

#[test]
fn test_render_failure_is_repeatable() {
    let criteria = Criteria::of("abv").between(json!([1]));
    assert!(criteria.render().is_err());
    assert!(criteria.render().is_err());
}
