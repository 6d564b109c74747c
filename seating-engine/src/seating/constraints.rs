//! Constraint builder
//!
//! Turns raw guest, group and preference records into a [`ConstraintGraph`]:
//!
//! ```text
//! confirmed parties ──┐
//! enabled preferences ├─→ union-find (must + together + same table) ─→ clusters
//! guest groups ───────┘                                                   │
//!        apart edges / adjacency requirements / try hints ←───────────────┘
//! ```
//!
//! Clusters come out in placement order: ascending group priority, then
//! descending weight, then earliest-created party. A cluster's id is its
//! position in that order.

use super::context::RunContext;
use super::union_find::UnionFind;
use shared::models::{
    Guest, GuestGroup, PreferenceScope, PreferenceStrength, PreferenceType, SeatingPreference,
};
use std::collections::{HashMap, HashSet, VecDeque};

pub type ClusterId = usize;

/// Priority given to parties outside any group (placed after every group)
pub const UNGROUPED_PRIORITY: i32 = i32::MAX;

/// One guest party as the solver sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
    pub guest_id: i64,
    pub adults: i32,
    pub children: i32,
    pub group_id: Option<i64>,
    pub created_at: i64,
}

impl Party {
    fn from_guest(guest: &Guest) -> Self {
        Self {
            guest_id: guest.id,
            adults: guest.adults_attending.max(0),
            children: guest.children_attending.max(0),
            group_id: guest.group_id,
            created_at: guest.created_at,
        }
    }

    pub fn weight(&self) -> i32 {
        self.adults + self.children
    }
}

/// Parties that must share one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub id: ClusterId,
    /// Sorted by creation order
    pub parties: Vec<Party>,
    pub weight: i32,
    pub adults: i32,
    pub children: i32,
    pub priority: i32,
    pub zone: Option<String>,
}

impl Cluster {
    pub fn guest_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.parties.iter().map(|p| p.guest_id)
    }

    /// Children outnumber adults
    pub fn is_kid_cluster(&self) -> bool {
        self.children > self.adults
    }

    /// A lone person: one party of weight one
    pub fn is_single(&self) -> bool {
        self.parties.len() == 1 && self.weight == 1
    }

    pub fn contains_group(&self, group_id: i64) -> bool {
        self.parties.iter().any(|p| p.group_id == Some(group_id))
    }

    fn first_created(&self) -> (i64, i64) {
        self.parties
            .first()
            .map(|p| (p.created_at, p.guest_id))
            .unwrap_or((i64::MAX, i64::MAX))
    }
}

/// Hard "apart" edge to another cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApartEdge {
    pub other: ClusterId,
    /// `SameTable` forbids sharing a table; `AdjacentTables` also forbids
    /// neighbouring tables when adjacency is enforced
    pub scope: PreferenceScope,
    pub preference_id: i64,
}

/// Must-together at adjacent tables (clusters stay separate)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjacencyRequirement {
    pub other: ClusterId,
    pub preference_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ConstraintGraph {
    clusters: Vec<Cluster>,
    cluster_of: HashMap<i64, ClusterId>,
    apart: Vec<Vec<ApartEdge>>,
    adjacent: Vec<Vec<AdjacencyRequirement>>,
    try_together: Vec<Vec<ClusterId>>,
    try_apart: Vec<Vec<ClusterId>>,
}

impl ConstraintGraph {
    fn with_clusters(clusters: Vec<Cluster>) -> Self {
        let n = clusters.len();
        let cluster_of = clusters
            .iter()
            .flat_map(|c| c.guest_ids().map(move |g| (g, c.id)))
            .collect();
        Self {
            clusters,
            cluster_of,
            apart: vec![Vec::new(); n],
            adjacent: vec![Vec::new(); n],
            try_together: vec![Vec::new(); n],
            try_apart: vec![Vec::new(); n],
        }
    }

    /// Clusters in placement order
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn cluster(&self, id: ClusterId) -> &Cluster {
        &self.clusters[id]
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Cluster holding a confirmed guest
    pub fn cluster_of(&self, guest_id: i64) -> Option<ClusterId> {
        self.cluster_of.get(&guest_id).copied()
    }

    pub fn apart_edges(&self, id: ClusterId) -> &[ApartEdge] {
        &self.apart[id]
    }

    pub fn adjacency_requirements(&self, id: ClusterId) -> &[AdjacencyRequirement] {
        &self.adjacent[id]
    }

    pub fn try_together(&self, id: ClusterId) -> &[ClusterId] {
        &self.try_together[id]
    }

    pub fn try_apart(&self, id: ClusterId) -> &[ClusterId] {
        &self.try_apart[id]
    }

    /// Wedding-wide children across confirmed parties
    pub fn total_children(&self) -> i32 {
        self.clusters.iter().map(|c| c.children).sum()
    }

    pub fn apart_edge_count(&self) -> usize {
        self.apart.iter().map(Vec::len).sum::<usize>() / 2
    }

    fn add_apart(&mut self, a: ClusterId, b: ClusterId, scope: PreferenceScope, preference_id: i64) {
        for (from, to) in [(a, b), (b, a)] {
            let edges = &mut self.apart[from];
            match edges.iter_mut().find(|e| e.other == to) {
                Some(edge) => {
                    if scope > edge.scope {
                        edge.scope = scope;
                        edge.preference_id = preference_id;
                    }
                }
                None => edges.push(ApartEdge {
                    other: to,
                    scope,
                    preference_id,
                }),
            }
        }
    }

    fn add_adjacency(&mut self, a: ClusterId, b: ClusterId, preference_id: i64) {
        for (from, to) in [(a, b), (b, a)] {
            let reqs = &mut self.adjacent[from];
            if !reqs.iter().any(|r| r.other == to) {
                reqs.push(AdjacencyRequirement {
                    other: to,
                    preference_id,
                });
            }
        }
    }

    fn finalize(&mut self) {
        for edges in &mut self.apart {
            edges.sort_by_key(|e| e.other);
        }
        for reqs in &mut self.adjacent {
            reqs.sort_by_key(|r| r.other);
        }
        for hints in self.try_together.iter_mut().chain(self.try_apart.iter_mut()) {
            hints.sort_unstable();
            hints.dedup();
        }
    }
}

/// Builds the constraint graph for one run
pub struct ConstraintBuilder<'a> {
    guests: &'a [Guest],
    groups: &'a [GuestGroup],
    preferences: &'a [SeatingPreference],
}

impl<'a> ConstraintBuilder<'a> {
    pub fn new(
        guests: &'a [Guest],
        groups: &'a [GuestGroup],
        preferences: &'a [SeatingPreference],
    ) -> Self {
        Self {
            guests,
            groups,
            preferences,
        }
    }

    pub fn build(&self, ctx: &mut RunContext) -> ConstraintGraph {
        let known: HashSet<i64> = self.guests.iter().map(|g| g.id).collect();

        let mut seatable: Vec<&Guest> = self.guests.iter().filter(|g| g.is_seatable()).collect();
        seatable.sort_by_key(|g| (g.created_at, g.id));
        let index: HashMap<i64, usize> = seatable
            .iter()
            .enumerate()
            .map(|(i, g)| (g.id, i))
            .collect();

        let valid = self.valid_preferences(ctx, &known, &index);

        // Must-together at the same table merges parties
        let mut uf = UnionFind::new(seatable.len());
        let mut together_links: HashMap<usize, Vec<(usize, i64)>> = HashMap::new();
        for (pref, ia, ib) in &valid {
            if is_must_together_same_table(pref) {
                uf.union(*ia, *ib);
                together_links.entry(*ia).or_default().push((*ib, pref.id));
                together_links.entry(*ib).or_default().push((*ia, pref.id));
            }
        }

        let groups_by_id: HashMap<i64, &GuestGroup> =
            self.groups.iter().map(|g| (g.id, g)).collect();
        let mut clusters: Vec<Cluster> = uf
            .sets()
            .into_iter()
            .map(|members| make_cluster(&members, &seatable, &groups_by_id))
            .collect();
        clusters.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(b.weight.cmp(&a.weight))
                .then(a.first_created().cmp(&b.first_created()))
        });
        for (id, cluster) in clusters.iter_mut().enumerate() {
            cluster.id = id;
        }

        let mut graph = ConstraintGraph::with_clusters(clusters);
        let by_id: HashMap<i64, &SeatingPreference> =
            valid.iter().map(|(p, _, _)| (p.id, *p)).collect();

        for (pref, ia, ib) in &valid {
            let (Some(ca), Some(cb)) = (
                graph.cluster_of(pref.guest_a_id),
                graph.cluster_of(pref.guest_b_id),
            ) else {
                continue;
            };

            match (pref.pref_type, pref.strength) {
                (PreferenceType::Together, PreferenceStrength::Must) => {
                    // Same-table musts were merged above; a pair already merged
                    // by other rules trivially satisfies adjacency.
                    if pref.scope == PreferenceScope::AdjacentTables && ca != cb {
                        graph.add_adjacency(ca, cb, pref.id);
                    }
                }
                (PreferenceType::Apart, PreferenceStrength::Must) => {
                    if ca == cb {
                        let mut rule_ids = together_chain(&together_links, *ia, *ib);
                        rule_ids.push(pref.id);
                        rule_ids.sort_unstable();
                        let guests = rule_ids
                            .iter()
                            .filter_map(|id| by_id.get(id))
                            .flat_map(|p| [p.guest_a_id, p.guest_b_id]);
                        ctx.conflicts.mutually_unsatisfiable(
                            guests,
                            &rule_ids,
                            "guests must sit apart but must-together rules bind them to one table",
                        );
                    } else {
                        graph.add_apart(ca, cb, pref.scope, pref.id);
                    }
                }
                (PreferenceType::Together, PreferenceStrength::Try) => {
                    if ca != cb {
                        graph.try_together[ca].push(cb);
                        graph.try_together[cb].push(ca);
                    }
                }
                (PreferenceType::Apart, PreferenceStrength::Try) => {
                    if ca != cb {
                        graph.try_apart[ca].push(cb);
                        graph.try_apart[cb].push(ca);
                    }
                }
            }
        }

        // must-adjacent vs must-apart-including-adjacent between the same clusters
        for ca in 0..graph.len() {
            for req in &graph.adjacent[ca] {
                if req.other < ca {
                    continue;
                }
                let clash = graph.apart[ca].iter().find(|e| {
                    e.other == req.other && e.scope == PreferenceScope::AdjacentTables
                });
                if let Some(edge) = clash {
                    let rule_ids = [req.preference_id, edge.preference_id];
                    let guests = rule_ids
                        .iter()
                        .filter_map(|id| by_id.get(id))
                        .flat_map(|p| [p.guest_a_id, p.guest_b_id])
                        .collect::<Vec<_>>();
                    ctx.conflicts.mutually_unsatisfiable(
                        guests,
                        &rule_ids,
                        "guests must sit at adjacent tables and must not sit at adjacent tables",
                    );
                }
            }
        }

        graph.finalize();

        tracing::debug!(
            run_id = %ctx.run_id,
            parties = seatable.len(),
            clusters = graph.len(),
            apart_edges = graph.apart_edge_count(),
            "Constraint graph built"
        );

        graph
    }

    /// Enabled preferences whose guests are both seatable, sorted by id.
    /// Dangling references are reported and dropped.
    fn valid_preferences(
        &self,
        ctx: &mut RunContext,
        known: &HashSet<i64>,
        index: &HashMap<i64, usize>,
    ) -> Vec<(&'a SeatingPreference, usize, usize)> {
        let mut prefs: Vec<&SeatingPreference> =
            self.preferences.iter().filter(|p| p.enabled).collect();
        prefs.sort_by_key(|p| p.id);

        let mut valid = Vec::with_capacity(prefs.len());
        for pref in prefs {
            if pref.guest_a_id == pref.guest_b_id {
                ctx.conflicts
                    .dangling_reference(pref, "both sides name the same guest");
                continue;
            }

            let missing: Vec<i64> = [pref.guest_a_id, pref.guest_b_id]
                .into_iter()
                .filter(|id| !known.contains(id))
                .collect();
            if !missing.is_empty() {
                ctx.conflicts
                    .dangling_reference(pref, &format!("guest(s) {:?} do not exist", missing));
                continue;
            }

            match (index.get(&pref.guest_a_id), index.get(&pref.guest_b_id)) {
                (Some(&ia), Some(&ib)) => valid.push((pref, ia, ib)),
                _ => {
                    tracing::debug!(
                        preference_id = pref.id,
                        "Preference skipped: guest not confirmed"
                    );
                }
            }
        }
        valid
    }
}

fn is_must_together_same_table(pref: &SeatingPreference) -> bool {
    pref.pref_type == PreferenceType::Together
        && pref.strength == PreferenceStrength::Must
        && pref.scope == PreferenceScope::SameTable
}

fn make_cluster(
    members: &[usize],
    seatable: &[&Guest],
    groups_by_id: &HashMap<i64, &GuestGroup>,
) -> Cluster {
    // members are ascending indices into the creation-ordered party list
    let parties: Vec<Party> = members
        .iter()
        .map(|&i| Party::from_guest(seatable[i]))
        .collect();

    let mut groups: Vec<&GuestGroup> = parties
        .iter()
        .filter_map(|p| p.group_id)
        .filter_map(|id| groups_by_id.get(&id).copied())
        .collect();
    groups.sort_by_key(|g| (g.priority, g.id));

    let priority = groups.first().map(|g| g.priority).unwrap_or(UNGROUPED_PRIORITY);
    let zone = groups.iter().find_map(|g| g.zone.clone());

    Cluster {
        id: 0,
        weight: parties.iter().map(Party::weight).sum(),
        adults: parties.iter().map(|p| p.adults).sum(),
        children: parties.iter().map(|p| p.children).sum(),
        parties,
        priority,
        zone,
    }
}

/// Must-together rule ids on a shortest path between two parties
fn together_chain(links: &HashMap<usize, Vec<(usize, i64)>>, from: usize, to: usize) -> Vec<i64> {
    let mut prev: HashMap<usize, (usize, i64)> = HashMap::new();
    let mut queue = VecDeque::from([from]);
    let mut seen = HashSet::from([from]);

    while let Some(node) = queue.pop_front() {
        if node == to {
            break;
        }
        let Some(next) = links.get(&node) else {
            continue;
        };
        for &(neighbour, pref_id) in next {
            if seen.insert(neighbour) {
                prev.insert(neighbour, (node, pref_id));
                queue.push_back(neighbour);
            }
        }
    }

    let mut chain = Vec::new();
    let mut node = to;
    while let Some(&(parent, pref_id)) = prev.get(&node) {
        chain.push(pref_id);
        node = parent;
    }
    chain
}
