//! Placement solver
//!
//! Greedy largest-first packing of clusters onto tables. Clusters are taken in
//! constraint-graph order; each goes to the best-ranked compatible table with
//! room that no apart edge excludes, or to a freshly opened table.
//!
//! Ranking, lowest key wins:
//!
//! | # | key                                            |
//! |---|------------------------------------------------|
//! | 1 | kids table for kid clusters                    |
//! | 2 | unmet must-adjacent partners                   |
//! | 3 | try-together minus try-apart hints (higher)    |
//! | 4 | joins a lone single (`avoid_singles_alone`)    |
//! | 5 | zone mismatch (`enable_zone_placement`)        |
//! | 6 | seats left after placing (tightest fit)        |
//! | 7 | table number                                   |
//!
//! Every failure is reported through the run's conflict reporter; the solver
//! itself never fails.

use super::constraints::{Cluster, ClusterId, ConstraintGraph};
use super::context::RunContext;
use super::kids::KidsTablePolicy;
use shared::models::{
    AdjacencyPolicy, PreferenceScope, SeatAssignment, SeatingSettings, SeatingTable,
    TableAdjacency, TableType,
};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Hands out ids and numbers for tables the solver opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableAllocator {
    next_id: i64,
    next_number: i32,
}

impl TableAllocator {
    /// Start above every id and number in `tables`
    pub fn after<'t>(tables: impl IntoIterator<Item = &'t SeatingTable>) -> Self {
        let mut allocator = Self {
            next_id: 1,
            next_number: 1,
        };
        for table in tables {
            allocator.next_id = allocator.next_id.max(table.id + 1);
            allocator.next_number = allocator.next_number.max(table.table_number + 1);
        }
        allocator
    }

    fn allocate(&mut self) -> (i64, i32) {
        let next = (self.next_id, self.next_number);
        self.next_id += 1;
        self.next_number += 1;
        next
    }
}

/// Solver output for the clusters in scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    /// One row per placed party, sorted by (table, guest)
    pub assignments: Vec<SeatAssignment>,
    /// Tables opened by this run that ended up seating someone
    pub new_tables: Vec<SeatingTable>,
    pub unplaced_guest_ids: Vec<i64>,
}

#[derive(Debug)]
struct Slot {
    table: SeatingTable,
    used: i32,
    parties: usize,
    is_new: bool,
}

impl Slot {
    fn remaining(&self) -> i32 {
        self.table.capacity - self.used
    }

    fn seats_lone_single(&self) -> bool {
        self.parties == 1 && self.used == 1
    }
}

type RankKey = (u8, usize, i32, u8, u8, i32, i32);

pub struct PlacementSolver<'a> {
    graph: &'a ConstraintGraph,
    settings: SeatingSettings,
    slots: Vec<Slot>,
    /// Symmetric slot adjacency
    adjacent: HashSet<(usize, usize)>,
    cluster_slots: Vec<BTreeSet<usize>>,
    placed: Vec<Option<usize>>,
    allocator: TableAllocator,
    /// Kids tables still allowed to open for kid clusters
    kids_tables_left: usize,
}

impl<'a> PlacementSolver<'a> {
    pub fn new(
        graph: &'a ConstraintGraph,
        settings: &SeatingSettings,
        mut tables: Vec<SeatingTable>,
        adjacency: &[TableAdjacency],
        allocator: TableAllocator,
    ) -> Self {
        tables.sort_by_key(|t| (t.table_number, t.id));
        let index: HashMap<i64, usize> =
            tables.iter().enumerate().map(|(i, t)| (t.id, i)).collect();

        let mut adjacent = HashSet::new();
        for edge in adjacency {
            if let (Some(&a), Some(&b)) = (
                index.get(&edge.table_id),
                index.get(&edge.adjacent_table_id),
            ) && a != b
            {
                adjacent.insert((a, b));
                adjacent.insert((b, a));
            }
        }

        let slots = tables
            .into_iter()
            .map(|table| Slot {
                table,
                used: 0,
                parties: 0,
                is_new: false,
            })
            .collect();

        Self {
            graph,
            settings: settings.clone(),
            slots,
            adjacent,
            cluster_slots: vec![BTreeSet::new(); graph.len()],
            placed: vec![None; graph.len()],
            allocator,
            kids_tables_left: 0,
        }
    }

    /// Place every cluster in `scope` (all clusters when `None`) around the
    /// pinned assignments
    pub fn solve(
        mut self,
        ctx: &mut RunContext,
        scope: Option<&HashSet<ClusterId>>,
        pins: &[SeatAssignment],
    ) -> Placement {
        let graph = self.graph;
        let scoped: Vec<bool> = (0..graph.len())
            .map(|id| scope.is_none_or(|s| s.contains(&id)))
            .collect();
        let order: Vec<ClusterId> = (0..graph.len()).filter(|&id| scoped[id]).collect();

        self.apply_pins(pins, &scoped);
        self.report_pinned_violations(ctx, &scoped);

        let policy = KidsTablePolicy::evaluate(&self.settings, graph);
        let reserved = self.reserve_kids_tables(&policy, &order);

        for &id in &order {
            self.place(ctx, id);
        }

        if self.settings.avoid_singles_alone {
            self.rehome_lonely_singles(&order);
        }

        self.report_adjacency(ctx, &scoped);

        let placement = self.into_placement(ctx, &order);
        tracing::debug!(
            run_id = %ctx.run_id,
            clusters = order.len(),
            pins = pins.len(),
            kids_tables_reserved = reserved,
            assignments = placement.assignments.len(),
            new_tables = placement.new_tables.len(),
            unplaced = placement.unplaced_guest_ids.len(),
            "Placement finished"
        );
        placement
    }

    fn apply_pins(&mut self, pins: &[SeatAssignment], scoped: &[bool]) {
        let index: HashMap<i64, usize> = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, s)| (s.table.id, i))
            .collect();

        for pin in pins {
            let cluster = self.graph.cluster_of(pin.guest_id);
            if cluster.is_some_and(|c| scoped[c]) {
                tracing::debug!(guest_id = pin.guest_id, "Pin for re-solved guest ignored");
                continue;
            }
            let Some(&slot) = index.get(&pin.table_id) else {
                tracing::warn!(
                    guest_id = pin.guest_id,
                    table_id = pin.table_id,
                    "Pinned assignment references unknown table"
                );
                continue;
            };

            let s = &mut self.slots[slot];
            s.used += pin.seats_count;
            s.parties += 1;
            if let Some(c) = cluster {
                self.cluster_slots[c].insert(slot);
            }
        }
    }

    fn report_pinned_violations(&self, ctx: &mut RunContext, scoped: &[bool]) {
        let graph = self.graph;
        for a in 0..graph.len() {
            if scoped[a] {
                continue;
            }
            for edge in graph.apart_edges(a) {
                if edge.other < a || scoped[edge.other] {
                    continue;
                }
                let shared: Vec<i64> = self.cluster_slots[a]
                    .intersection(&self.cluster_slots[edge.other])
                    .map(|&s| self.slots[s].table.id)
                    .collect();
                if shared.is_empty() {
                    continue;
                }
                ctx.conflicts.apart_violated(
                    graph
                        .cluster(a)
                        .guest_ids()
                        .chain(graph.cluster(edge.other).guest_ids()),
                    shared,
                    format!(
                        "Pinned seating breaks apart preference {}",
                        edge.preference_id
                    ),
                );
            }
        }
    }

    /// Budget kids tables for the kid clusters in scope; they open on first use
    fn reserve_kids_tables(&mut self, policy: &KidsTablePolicy, order: &[ClusterId]) -> usize {
        if !policy.is_active() {
            return 0;
        }
        let kid_weight: i32 = order
            .iter()
            .map(|&id| self.graph.cluster(id))
            .filter(|c| c.is_kid_cluster())
            .map(|c| c.weight)
            .sum();
        let free: i32 = self
            .slots
            .iter()
            .filter(|s| s.table.table_type == TableType::Kids)
            .map(|s| s.remaining().max(0))
            .sum();

        self.kids_tables_left = policy.tables_to_reserve(kid_weight, free);
        self.kids_tables_left
    }

    fn place(&mut self, ctx: &mut RunContext, id: ClusterId) {
        let graph = self.graph;
        let cluster = graph.cluster(id);

        let best = (0..self.slots.len())
            .filter(|&s| self.is_candidate(cluster, s))
            .min_by_key(|&s| self.rank(cluster, s));

        let on_kids_table = best.is_some_and(|s| {
            KidsTablePolicy::tier(self.slots[s].table.table_type, cluster) == 0
        });
        let size = self.settings.new_table_size();
        let open_kids_table = !on_kids_table
            && cluster.is_kid_cluster()
            && self.kids_tables_left > 0
            && cluster.weight <= size;

        let slot = if open_kids_table {
            self.kids_tables_left -= 1;
            self.open_table(ctx, size, TableType::Kids, None)
        } else {
            match best {
                Some(slot) => slot,
                None => match self.open_for(ctx, cluster) {
                    Some(slot) => slot,
                    None => return,
                },
            }
        };
        self.seat(cluster, slot);
    }

    fn is_candidate(&self, cluster: &Cluster, slot: usize) -> bool {
        let s = &self.slots[slot];
        s.remaining() >= cluster.weight
            && KidsTablePolicy::accepts(s.table.table_type, cluster)
            && !self.is_forbidden(cluster, slot)
    }

    /// An apart edge excludes this table
    fn is_forbidden(&self, cluster: &Cluster, slot: usize) -> bool {
        let enforce = self.settings.adjacency_policy == AdjacencyPolicy::EnforceAdjacentPlacement;
        self.graph.apart_edges(cluster.id).iter().any(|edge| {
            let other = &self.cluster_slots[edge.other];
            other.contains(&slot)
                || (enforce
                    && edge.scope == PreferenceScope::AdjacentTables
                    && other.iter().any(|&o| self.adjacent.contains(&(slot, o))))
        })
    }

    fn rank(&self, cluster: &Cluster, slot: usize) -> RankKey {
        let s = &self.slots[slot];

        let adjacency_misses = if self.settings.adjacency_policy == AdjacencyPolicy::Ignore {
            0
        } else {
            self.graph
                .adjacency_requirements(cluster.id)
                .iter()
                .filter(|req| {
                    let partner = &self.cluster_slots[req.other];
                    !partner.is_empty() && !self.is_near(slot, partner)
                })
                .count()
        };

        let single_miss = self.settings.avoid_singles_alone
            && cluster.is_single()
            && !s.seats_lone_single();

        let zone_miss = self.settings.enable_zone_placement
            && cluster.zone.is_some()
            && s.table.zone != cluster.zone;

        (
            KidsTablePolicy::tier(s.table.table_type, cluster),
            adjacency_misses,
            -self.hint_score(cluster.id, slot),
            u8::from(single_miss),
            u8::from(zone_miss),
            s.remaining() - cluster.weight,
            s.table.table_number,
        )
    }

    fn hint_score(&self, id: ClusterId, slot: usize) -> i32 {
        let seated_here = |hints: &[ClusterId]| {
            hints
                .iter()
                .filter(|&&h| self.cluster_slots[h].contains(&slot))
                .count() as i32
        };
        seated_here(self.graph.try_together(id)) - seated_here(self.graph.try_apart(id))
    }

    /// Same table or a neighbouring one
    fn is_near(&self, slot: usize, others: &BTreeSet<usize>) -> bool {
        others
            .iter()
            .any(|&o| o == slot || self.adjacent.contains(&(slot, o)))
    }

    fn open_for(&mut self, ctx: &mut RunContext, cluster: &Cluster) -> Option<usize> {
        let weight = cluster.weight;
        let max_size = self.settings.max_table_size;
        if weight > max_size {
            ctx.conflicts.capacity_exceeded(
                cluster.guest_ids(),
                [],
                format!(
                    "Cluster of {} seats exceeds the maximum table size of {}",
                    weight, max_size
                ),
            );
            return None;
        }

        let size = self.settings.new_table_size();
        let capacity = weight.max(size);
        let zone = if self.settings.enable_zone_placement {
            cluster.zone.clone()
        } else {
            None
        };
        let slot = self.open_table(ctx, capacity, TableType::Mixed, zone);

        if weight > size {
            let table = &self.slots[slot].table;
            ctx.conflicts.capacity_exceeded(
                cluster.guest_ids(),
                [table.id],
                format!(
                    "No table fits {} seats together; opened table {} with {} seats",
                    weight, table.table_number, capacity
                ),
            );
        }
        Some(slot)
    }

    fn open_table(
        &mut self,
        ctx: &RunContext,
        capacity: i32,
        table_type: TableType,
        zone: Option<String>,
    ) -> usize {
        let (id, number) = self.allocator.allocate();
        let mut table = SeatingTable::auto(id, ctx.wedding_id, number, capacity, table_type);
        table.zone = zone;

        tracing::debug!(
            table_id = id,
            table_number = number,
            capacity,
            table_type = ?table_type,
            "Table opened"
        );

        self.slots.push(Slot {
            table,
            used: 0,
            parties: 0,
            is_new: true,
        });
        self.slots.len() - 1
    }

    fn seat(&mut self, cluster: &Cluster, slot: usize) {
        let s = &mut self.slots[slot];
        s.used += cluster.weight;
        s.parties += cluster.parties.len();
        self.cluster_slots[cluster.id].insert(slot);
        self.placed[cluster.id] = Some(slot);
    }

    fn unseat(&mut self, cluster: &Cluster, slot: usize) {
        let s = &mut self.slots[slot];
        s.used -= cluster.weight;
        s.parties -= cluster.parties.len();
        self.cluster_slots[cluster.id].remove(&slot);
        self.placed[cluster.id] = None;
    }

    /// Move singles left alone at a table next to other guests
    fn rehome_lonely_singles(&mut self, order: &[ClusterId]) {
        let graph = self.graph;
        for &id in order {
            let cluster = graph.cluster(id);
            let Some(from) = self.placed[id] else {
                continue;
            };
            if !cluster.is_single()
                || !graph.adjacency_requirements(id).is_empty()
                || self.slots[from].parties != 1
            {
                continue;
            }

            let target = (0..self.slots.len())
                .filter(|&s| s != from && self.slots[s].parties > 0)
                .filter(|&s| self.is_candidate(cluster, s))
                .min_by_key(|&s| self.rank(cluster, s));

            if let Some(to) = target {
                self.unseat(cluster, from);
                self.seat(cluster, to);
                tracing::debug!(
                    guest_ids = ?cluster.guest_ids().collect::<Vec<_>>(),
                    from_table = self.slots[from].table.id,
                    to_table = self.slots[to].table.id,
                    "Lone single moved"
                );
            }
        }
    }

    fn report_adjacency(&self, ctx: &mut RunContext, scoped: &[bool]) {
        let graph = self.graph;
        let ignore = self.settings.adjacency_policy == AdjacencyPolicy::Ignore;

        for a in 0..graph.len() {
            for req in graph.adjacency_requirements(a) {
                let b = req.other;
                if b < a || !(scoped[a] || scoped[b]) {
                    continue;
                }
                let (slots_a, slots_b) = (&self.cluster_slots[a], &self.cluster_slots[b]);
                if slots_a.is_empty() || slots_b.is_empty() {
                    continue;
                }

                let reason = if ignore {
                    format!(
                        "Adjacency policy is ignore; preference {} placed without adjacency",
                        req.preference_id
                    )
                } else if slots_a.iter().any(|&s| self.is_near(s, slots_b)) {
                    continue;
                } else {
                    format!(
                        "No adjacent table available for preference {}",
                        req.preference_id
                    )
                };

                let tables: Vec<i64> = slots_a
                    .union(slots_b)
                    .map(|&s| self.slots[s].table.id)
                    .collect();
                ctx.conflicts.no_adjacent_table(
                    graph
                        .cluster(a)
                        .guest_ids()
                        .chain(graph.cluster(b).guest_ids()),
                    tables,
                    reason,
                );
            }
        }
    }

    fn into_placement(self, ctx: &RunContext, order: &[ClusterId]) -> Placement {
        let graph = self.graph;
        let mut assignments = Vec::new();
        let mut unplaced_guest_ids = Vec::new();

        for &id in order {
            let cluster = graph.cluster(id);
            match self.placed[id] {
                Some(slot) => {
                    let table_id = self.slots[slot].table.id;
                    assignments.extend(cluster.parties.iter().map(|party| SeatAssignment {
                        wedding_id: ctx.wedding_id,
                        table_id,
                        guest_id: party.guest_id,
                        seats_count: party.weight(),
                        assignment_type: ctx.assignment_type,
                    }));
                }
                None => unplaced_guest_ids.extend(cluster.guest_ids()),
            }
        }

        assignments.sort_by_key(|a| (a.table_id, a.guest_id));
        unplaced_guest_ids.sort_unstable();

        let new_tables = self
            .slots
            .into_iter()
            .filter(|s| s.is_new && s.parties > 0)
            .map(|s| s.table)
            .collect();

        Placement {
            assignments,
            new_tables,
            unplaced_guest_ids,
        }
    }
}
