// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end merge scenarios and worker-count invariance.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
use std::sync::Arc;

use rupture_core::{
    ClusterRupture, MergerConfig, RuptureJumpDistFilter, RuptureMerger, SectionOverlapFilter,
    SplayCountFilter, UniqueRupture,
};

mod common;
use common::{
    id_gap, random_single_fault_ruptures, single, sorted_digests, XorShift64, SEEDS,
    WORKER_COUNTS,
};

fn distance_merger(max_dist: f64, workers: usize) -> RuptureMerger {
    let mut merger = RuptureMerger::new(MergerConfig {
        workers,
        progress_interval: 3,
        verbose: false,
    });
    merger
        .add_filter(SectionOverlapFilter)
        .add_filter(RuptureJumpDistFilter::new(max_dist, id_gap));
    merger
}

#[test]
fn close_pair_merges_into_one_multi_cluster_rupture() {
    let a = single(1, &[0, 1, 2]);
    let b = single(2, &[5, 6]);
    let merged = distance_merger(3.0, 1).merge(&a, &[Arc::clone(&b)]).unwrap();
    assert_eq!(merged.len(), 1);
    let m = &merged[0];
    assert!(m.is_multi_cluster());
    assert_eq!(*m.unique(), UniqueRupture::add(a.unique(), b.unique()));
    assert_eq!(m.internal_unique(), a.internal_unique());
    assert_eq!(m.splays().len(), 1);
    assert_eq!(m.total_num_sects(), 5);
    let jump = m.splays().keys().next().unwrap();
    assert!(jump.distance <= 3.0);
    assert_eq!(m.to_string(), "[1:0,1,2]\n\t--splay from [1:2]: [2:5,6]");
}

#[test]
fn distant_pair_yields_nothing() {
    let merged = distance_merger(3.0, 1)
        .merge(&single(1, &[0, 1, 2]), &[single(2, &[50, 51])])
        .unwrap();
    assert!(merged.is_empty());
}

#[test]
fn many_nucleations_equal_union_of_single_merges() {
    let merger = distance_merger(4.0, 2);
    let a = single(1, &[0, 1]);
    let c = single(3, &[20, 21]);
    let targets = [single(2, &[4, 5]), single(4, &[17]), single(5, &[90])];

    let mut expected = merger.merge(&a, &targets).unwrap();
    expected.extend(merger.merge(&c, &targets).unwrap());
    let batch = merger.merge_many(&[Arc::clone(&a), Arc::clone(&c)], &targets);
    assert!(batch.is_complete());
    let merged = batch.into_result().unwrap();

    assert_eq!(sorted_digests(&merged), sorted_digests(&expected));
    assert_eq!(merged.len(), 2);
}

#[test]
fn batch_output_is_independent_of_worker_count() {
    for &seed in SEEDS {
        let mut rng = XorShift64::new(seed);
        let nucleations = random_single_fault_ruptures(&mut rng, 4, 6);
        let targets = random_single_fault_ruptures(&mut rng, 4, 5);

        let baseline = distance_merger(120.0, 1)
            .merge_many(&nucleations, &targets)
            .into_result()
            .unwrap();
        for &workers in WORKER_COUNTS {
            let merged = distance_merger(120.0, workers)
                .merge_many(&nucleations, &targets)
                .into_result()
                .unwrap();
            assert_eq!(merged.len(), baseline.len(), "seed {seed}, {workers} workers");
            // Sorted by nucleation index, target order within: identical sequence.
            for (x, y) in merged.iter().zip(&baseline) {
                assert_eq!(x.unique(), y.unique(), "seed {seed}, {workers} workers");
            }
        }
    }
}

#[test]
fn merged_ruptures_never_overlap_when_overlap_filter_is_registered() {
    let mut rng = XorShift64::new(99);
    let ruptures = random_single_fault_ruptures(&mut rng, 3, 8);
    let merged = distance_merger(150.0, 4)
        .merge_many(&ruptures, &ruptures)
        .into_result()
        .unwrap();
    assert!(!merged.is_empty());
    for m in &merged {
        let splay = m.splays().values().next().unwrap();
        assert_eq!(m.total_num_sects(), m.num_internal_sects() + splay.total_num_sects());
    }
}

#[test]
fn without_overlap_filter_shared_sections_are_merged_as_is() {
    let mut merger = RuptureMerger::new(MergerConfig::default());
    merger.add_filter(RuptureJumpDistFilter::new(1.0, id_gap));
    let a = single(1, &[0, 1, 2]);
    let b = single(1, &[2, 3]);
    let merged = merger.merge(&a, &[Arc::clone(&b)]).unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(*merged[0].unique(), UniqueRupture::for_ids(0..=3));
}

#[test]
fn merged_ruptures_can_nucleate_again() {
    let mut merger = RuptureMerger::new(MergerConfig::default());
    merger
        .add_filter(SplayCountFilter::new(2))
        .add_filter(SectionOverlapFilter)
        .add_filter(RuptureJumpDistFilter::new(5.0, id_gap));
    let a = single(1, &[10, 11]);
    let round_one = merger.merge(&a, &[single(2, &[14])]).unwrap();
    assert_eq!(round_one.len(), 1);

    let round_two = merger
        .merge(&round_one[0], &[single(3, &[7]), single(4, &[40])])
        .unwrap();
    assert_eq!(round_two.len(), 1);
    let twice = &round_two[0];
    assert_eq!(twice.splays().len(), 2);
    assert!(twice.splays().extends(round_one[0].splays()));
    assert_eq!(*twice.unique(), UniqueRupture::for_ids([7, 10, 11, 14]));

    let round_three = merger.merge(twice, &[single(5, &[12])]).unwrap();
    assert!(round_three.is_empty());
}

#[test]
fn merged_rupture_navigator_resolves_grafted_sections() {
    let a = single(1, &[0, 1]);
    let b = single(2, &[3, 4]);
    let merged = distance_merger(2.0, 1).merge(&a, &[b]).unwrap();
    let m: &ClusterRupture = &merged[0];
    let nav = m.tree_navigator();
    let grafted = nav.locate_cluster(4).unwrap();
    assert_eq!(grafted.parent_id(), 2);
    assert_eq!(nav.predecessor(grafted).map(|c| c.parent_id()), Some(1));
    let full: Vec<u32> = m.build_full_section_list().iter().map(|s| s.id).collect();
    assert_eq!(full, vec![0, 1, 3, 4]);
    let primary: Vec<u32> = m.build_ordered_section_list().map(|s| s.id).collect();
    assert_eq!(primary, vec![0, 1]);
}
