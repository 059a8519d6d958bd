use crate::{symbol::SymbolSet, types::Map};
use indexmap::map::Slice;
use std::{cmp, hash::Hash};

pub trait Set {
    fn union_with(&mut self, other: &Self);
}

impl Set for SymbolSet {
    fn union_with(&mut self, other: &Self) {
        SymbolSet::union_with(self, other);
    }
}

/// Calculate `F(x) = F'(x) \cup \bigcup { F(y) | x R y }` in place.
///
/// `result` holds `F'` on entry. The relation maps the position of `x` in
/// `result` to the positions of every `y` with `x R y`.
pub fn digraph<K, T, F, I>(result: &mut Map<K, T>, relation: F)
where
    K: Eq + Hash,
    T: Set,
    F: Fn(usize) -> I,
    I: IntoIterator<Item = usize>,
{
    let len = result.len();
    Digraph {
        result: result.as_mut_slice(),
        relation,
        n: vec![0usize; len],
        stack: vec![],
    }
    .run()
}

struct Digraph<'a, K, T, F> {
    result: &'a mut Slice<K, T>,
    relation: F,
    n: Vec<usize>,
    stack: Vec<usize>,
}

impl<K, T, F, I> Digraph<'_, K, T, F>
where
    T: Set,
    F: Fn(usize) -> I,
    I: IntoIterator<Item = usize>,
{
    fn run(&mut self) {
        for x in 0..self.n.len() {
            if self.n[x] == 0 {
                self.traverse(x);
            }
        }
    }

    fn traverse(&mut self, x: usize) {
        self.stack.push(x);
        let d = self.stack.len();
        self.n[x] = d;

        let related: Vec<usize> = (self.relation)(x).into_iter().collect();
        for y in related {
            if self.n[y] == 0 {
                self.traverse(y);
            }
            self.n[x] = cmp::min(self.n[x], self.n[y]);

            if x != y {
                // F(x) <- F(x) \cup F(y)
                let (slot, added) = get_two_mut(&mut *self.result, x, y);
                slot.union_with(added);
            }
        }

        if self.n[x] != d {
            return;
        }

        while let Some(s) = self.stack.pop() {
            self.n[s] = usize::MAX;
            if s == x {
                break;
            }
            // F(s) <- F(x)
            let (slot, added) = get_two_mut(&mut *self.result, s, x);
            slot.union_with(added);
        }
    }
}

fn get_two_mut<K, V>(slice: &mut Slice<K, V>, x: usize, y: usize) -> (&mut V, &mut V) {
    assert!(
        x != y && cmp::max(x, y) < slice.len(),
        "index condition not satisfied"
    );
    let i = (x + y) / 2 + 1;
    let (a, b) = slice.split_at_mut(i);
    if x < y {
        (&mut a[x], &mut b[y - i])
    } else {
        (&mut b[x - i], &mut a[y])
    }
}
