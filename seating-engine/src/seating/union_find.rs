//! Disjoint-set forest over party indices
//!
//! Used to merge parties linked by must-together same-table preferences into
//! clusters. Path compression keeps `find` flat; guest lists are small so
//! union-by-rank is only there to keep trees shallow between compressions.

#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Root of the set containing `x`, compressing the path on the way
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }

        root
    }

    /// Merge the sets of `a` and `b`. Returns false if they were already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }

        // Equal rank: the lower index wins so the result does not depend on
        // argument order.
        let (root, child) = match self.rank[root_a].cmp(&self.rank[root_b]) {
            std::cmp::Ordering::Greater => (root_a, root_b),
            std::cmp::Ordering::Less => (root_b, root_a),
            std::cmp::Ordering::Equal => {
                let (root, child) = if root_a < root_b {
                    (root_a, root_b)
                } else {
                    (root_b, root_a)
                };
                self.rank[root] += 1;
                (root, child)
            }
        };
        self.parent[child] = root;
        true
    }

    pub fn connected(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    /// All sets, each sorted ascending, ordered by their smallest member
    pub fn sets(&mut self) -> Vec<Vec<usize>> {
        let mut by_root: Vec<Option<usize>> = vec![None; self.len()];
        let mut sets: Vec<Vec<usize>> = Vec::new();

        for x in 0..self.len() {
            let root = self.find(x);
            match by_root[root] {
                Some(slot) => sets[slot].push(x),
                None => {
                    by_root[root] = Some(sets.len());
                    sets.push(vec![x]);
                }
            }
        }

        sets
    }
}
