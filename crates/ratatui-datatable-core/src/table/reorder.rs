/// Moves `dragged` to the index currently held by `over`.
///
/// The element is removed and reinserted at the drop target's original index, so dragging
/// forward lands after the target and dragging backward lands before it. Returns `None` when
/// either id is missing or both are the same; the result is always a permutation of `order`.
pub fn array_move<T: PartialEq + Clone>(order: &[T], dragged: &T, over: &T) -> Option<Vec<T>> {
    if dragged == over {
        return None;
    }
    let from = order.iter().position(|id| id == dragged)?;
    let to = order.iter().position(|id| id == over)?;

    let mut next = order.to_vec();
    let item = next.remove(from);
    next.insert(to, item);
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn moves_backward_before_target() {
        let order = ["c1", "c2", "c3", "c4"];
        assert_eq!(
            array_move(&order, &"c4", &"c2"),
            Some(vec!["c1", "c4", "c2", "c3"])
        );
    }

    #[test]
    fn moves_forward_after_target() {
        let order = ["a", "b", "c", "d"];
        assert_eq!(
            array_move(&order, &"a", &"c"),
            Some(vec!["b", "c", "a", "d"])
        );
    }

    #[test]
    fn identical_or_unknown_ids_are_no_ops() {
        let order = ["a", "b"];
        assert_eq!(array_move(&order, &"a", &"a"), None);
        assert_eq!(array_move(&order, &"a", &"z"), None);
        assert_eq!(array_move(&order, &"z", &"a"), None);
    }

    proptest! {
        #[test]
        fn reorder_is_a_permutation(len in 2usize..12, a in 0usize..12, b in 0usize..12) {
            let order: Vec<usize> = (0..len).collect();
            let (a, b) = (a % len, b % len);
            match array_move(&order, &a, &b) {
                None => prop_assert_eq!(a, b),
                Some(next) => {
                    prop_assert_eq!(next.len(), order.len());
                    let mut sorted = next.clone();
                    sorted.sort_unstable();
                    prop_assert_eq!(&sorted, &order);
                    prop_assert_eq!(next.iter().position(|x| *x == a), Some(b));
                }
            }
        }
    }
}
