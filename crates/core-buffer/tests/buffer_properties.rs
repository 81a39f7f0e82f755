//! Property tests for selection edits and undo/redo replay.

use core_buffer::{EditableBuffer, IndexSelection, SparseIndexedValues, UndoableEditableBuffer};
use proptest::prelude::*;

fn contents_and_selection() -> impl Strategy<Value = (Vec<i32>, Vec<usize>)> {
    proptest::collection::vec(any::<i32>(), 1..64).prop_flat_map(|data| {
        let len = data.len();
        (
            Just(data),
            proptest::collection::vec(0..len, 1..=len),
        )
    })
}

#[derive(Debug, Clone)]
enum Op {
    Set(usize, i32),
    Push(i32),
    Insert(usize, i32),
    RemoveAt(usize),
    RemoveRange(usize, usize),
    Xor(Vec<usize>, i32),
    RemoveSelection(Vec<usize>),
    InsertSelf(usize),
    Clear,
    ExtendFrom(Vec<i32>),
    InsertRange(usize, Vec<i32>),
    SetRange(usize, Vec<i32>),
    WriteSelection(Vec<usize>, i32),
    InsertSelection(Vec<usize>, i32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<usize>(), any::<i32>()).prop_map(|(i, v)| Op::Set(i, v)),
        any::<i32>().prop_map(Op::Push),
        (any::<usize>(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
        any::<usize>().prop_map(Op::RemoveAt),
        (any::<usize>(), 0usize..4).prop_map(|(i, n)| Op::RemoveRange(i, n)),
        (proptest::collection::vec(any::<usize>(), 1..6), any::<i32>())
            .prop_map(|(s, m)| Op::Xor(s, m)),
        proptest::collection::vec(any::<usize>(), 1..6).prop_map(Op::RemoveSelection),
        any::<usize>().prop_map(Op::InsertSelf),
        Just(Op::Clear),
        proptest::collection::vec(any::<i32>(), 0..4).prop_map(Op::ExtendFrom),
        (any::<usize>(), proptest::collection::vec(any::<i32>(), 0..4))
            .prop_map(|(i, items)| Op::InsertRange(i, items)),
        (any::<usize>(), proptest::collection::vec(any::<i32>(), 1..4))
            .prop_map(|(i, items)| Op::SetRange(i, items)),
        (proptest::collection::vec(any::<usize>(), 1..6), any::<i32>())
            .prop_map(|(s, v)| Op::WriteSelection(s, v)),
        (proptest::collection::vec(any::<usize>(), 1..6), any::<i32>())
            .prop_map(|(s, v)| Op::InsertSelection(s, v)),
    ]
}

// Distinct final slots for `raw.len()` inserted values, all below
// `len + raw.len()`. A taken slot moves to the next free one.
fn insert_targets(raw: &[usize], len: usize) -> IndexSelection {
    let total = len + raw.len();
    let mut taken = vec![false; total];
    for &r in raw {
        let mut slot = r % total;
        while taken[slot] {
            slot = (slot + 1) % total;
        }
        taken[slot] = true;
    }
    IndexSelection::from_indices((0..total).filter(|&i| taken[i])).unwrap()
}

fn numbered(selection: IndexSelection, seed: i32) -> SparseIndexedValues<i32> {
    let values = (0..selection.count() as i32)
        .map(|k| seed.wrapping_add(k))
        .collect();
    SparseIndexedValues::from_parts(selection, values).unwrap()
}

// Fold raw indices into the current length so most generated ops succeed.
fn apply(buf: &mut UndoableEditableBuffer<i32>, op: &Op) {
    let len = buf.len();
    let selection = |raw: &[usize]| {
        (len > 0).then(|| IndexSelection::from_indices(raw.iter().map(|i| i % len)).unwrap())
    };
    match op {
        Op::Set(i, v) if len > 0 => buf.set(i % len, *v).unwrap(),
        Op::Push(v) => buf.push(*v),
        Op::Insert(i, v) => buf.insert(i % (len + 1), *v).unwrap(),
        Op::RemoveAt(i) if len > 0 => {
            buf.remove_at(i % len).unwrap();
        }
        Op::RemoveRange(i, n) => {
            let at = i % (len + 1);
            buf.remove_range(at, (*n).min(len - at)).unwrap();
        }
        Op::Xor(raw, mask) => {
            if let Some(s) = selection(raw) {
                buf.transform_selection(&s, |v| v ^ mask).unwrap();
            }
        }
        Op::RemoveSelection(raw) => {
            if let Some(s) = selection(raw) {
                buf.remove_selection(&s).unwrap();
            }
        }
        Op::InsertSelf(i) if len < 256 => buf.insert_self(i % (len + 1)).unwrap(),
        Op::Clear => buf.clear(),
        Op::ExtendFrom(items) => buf.extend_from(items),
        Op::InsertRange(i, items) => buf.insert_range(i % (len + 1), items).unwrap(),
        Op::SetRange(i, items) if len > 0 => {
            let at = i % len;
            let n = items.len().min(len - at);
            buf.set_range(at, &items[..n]).unwrap();
        }
        Op::WriteSelection(raw, seed) => {
            if let Some(s) = selection(raw) {
                buf.write_selection(&numbered(s, *seed)).unwrap();
            }
        }
        Op::InsertSelection(raw, seed) => {
            let values = numbered(insert_targets(raw, len), *seed);
            buf.insert_selection(&values).unwrap();
        }
        _ => {}
    }
}

proptest! {
    // Removing a selection and re-inserting its snapshot is the identity.
    #[test]
    fn remove_insert_roundtrip((data, raw) in contents_and_selection()) {
        let selection = IndexSelection::from_indices(raw).unwrap();
        let mut buf = EditableBuffer::from_slice(&data);
        let snapshot = buf.snapshot(&selection).unwrap();
        buf.remove_selection(&selection).unwrap();
        prop_assert_eq!(buf.len(), data.len() - selection.count());
        buf.insert_selection(&snapshot).unwrap();
        prop_assert_eq!(buf.to_vec(), data);
    }

    // Inserted values land at their indices; old elements keep their order.
    // `layout[i]` marks whether final slot `i` holds an inserted value.
    #[test]
    fn insert_selection_placement(layout in proptest::collection::vec(any::<bool>(), 1..96)) {
        prop_assume!(layout.iter().any(|&inserted| inserted));
        let kept = layout.iter().filter(|&&inserted| !inserted).count();
        let base: Vec<i32> = (0..kept as i32).collect();
        let selection = IndexSelection::from_indices(
            layout.iter().enumerate().filter(|(_, inserted)| **inserted).map(|(i, _)| i),
        )
        .unwrap();
        let values: Vec<i32> = (0..selection.count() as i32).map(|v| -1 - v).collect();
        let sparse = SparseIndexedValues::from_parts(selection.clone(), values).unwrap();

        let mut buf = EditableBuffer::from_slice(&base);
        let before = buf.version();
        buf.insert_selection(&sparse).unwrap();
        prop_assert_eq!(buf.len(), layout.len());
        prop_assert_eq!(buf.version(), before + 1);
        for (index, value) in sparse.iter() {
            prop_assert_eq!(buf.get(index).unwrap(), *value);
        }
        let survivors: Vec<i32> = buf
            .iter()
            .enumerate()
            .filter(|(i, _)| !selection.contains(*i))
            .map(|(_, v)| *v)
            .collect();
        prop_assert_eq!(survivors, base);
    }

    // N undos walk back through every intermediate state; N redos walk forward.
    #[test]
    fn undo_redo_replays_every_state(initial in proptest::collection::vec(any::<i32>(), 0..16), ops in proptest::collection::vec(op(), 1..24)) {
        let mut buf = UndoableEditableBuffer::from_slice(&initial);
        let mut states = vec![buf.to_vec()];
        for op in &ops {
            let recorded = buf.history_count();
            apply(&mut buf, op);
            if buf.history_count() > recorded {
                states.push(buf.to_vec());
            }
        }
        let n = buf.history_count();
        prop_assert_eq!(n, states.len() - 1);
        prop_assert_eq!(buf.history_index(), n);

        for step in (0..n).rev() {
            prop_assert!(buf.undo().unwrap());
            prop_assert_eq!(buf.history_index(), step);
            prop_assert!(buf.can_redo());
            prop_assert_eq!(&buf.to_vec(), &states[step]);
        }
        prop_assert!(!buf.can_undo());

        for step in 1..=n {
            prop_assert!(buf.redo().unwrap());
            prop_assert_eq!(buf.history_index(), step);
            prop_assert_eq!(&buf.to_vec(), &states[step]);
        }
        prop_assert!(!buf.can_redo());
        prop_assert_eq!(buf.history_count(), n);
    }
}
