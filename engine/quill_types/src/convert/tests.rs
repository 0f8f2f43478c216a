use super::*;
use pretty_assertions::assert_eq;

use BasicKind::{Bool, Byte, Char, Float, Int};
use Convertibility::{Castable, Demoted, Equivalent, Promoted, Unconvertible};

const ORDER: [BasicKind; 5] = [Bool, Byte, Char, Int, Float];

#[test]
fn matrix_matches_reference_table() {
    // One row per source kind, columns in bool/byte/char/int/float order.
    let expected = [
        [Equivalent, Castable, Unconvertible, Castable, Unconvertible],
        [Castable, Equivalent, Castable, Promoted, Promoted],
        [Unconvertible, Castable, Equivalent, Castable, Unconvertible],
        [Castable, Demoted, Castable, Equivalent, Promoted],
        [Unconvertible, Demoted, Unconvertible, Demoted, Equivalent],
    ];
    for (i, from) in ORDER.iter().enumerate() {
        for (j, to) in ORDER.iter().enumerate() {
            assert_eq!(
                scalar_convertibility(*from, *to),
                expected[i][j],
                "from {from:?} to {to:?}"
            );
        }
    }
}

#[test]
fn diagonal_is_equivalent() {
    for kind in ORDER {
        assert_eq!(scalar_convertibility(kind, kind), Equivalent);
    }
}

#[test]
fn safety_classification() {
    assert!(Equivalent.is_safe());
    assert!(Promoted.is_safe());
    assert!(Demoted.is_safe());
    assert!(Convertibility::Downgraded.is_safe());
    assert!(!Castable.is_safe());
    assert!(!Convertibility::Unsafe.is_safe());
    assert!(!Unconvertible.is_safe());
    assert!(!Unconvertible.is_convertible());
    assert!(Castable.is_convertible());
}

#[test]
fn promotion_is_not_symmetric() {
    assert_eq!(scalar_convertibility(Byte, Int), Promoted);
    assert_eq!(scalar_convertibility(Int, Byte), Demoted);
    assert_eq!(scalar_convertibility(Int, Float), Promoted);
    assert_eq!(scalar_convertibility(Float, Int), Demoted);
}
