//! End-to-end alignment scenarios through the public API.

use pairalign::{
    align_pair, align_pairwise, AlignConfig, AlignError, Alignment, Band, Coordinate, Dna4,
    EndGaps, Execution, GapScheme, Labeled, MatrixScoring, Method, Output, SimpleScoring,
    INVALID_SCORE,
};

fn gapped(seq: &[pairalign::Gapped<u8>]) -> String {
    seq.iter().map(|g| g.to_char()).collect()
}

fn local_config() -> AlignConfig<SimpleScoring> {
    AlignConfig::builder()
        .with_method(Method::Local)
        .with_scoring(SimpleScoring::new(4, -5))
        .with_gap(GapScheme::new(-10, -1))
        .build()
        .unwrap()
}

#[test]
fn local_alignment_finds_the_shared_core() {
    let result = align_pair(
        b"AACCGGTTTAACCGGTT".as_slice(),
        b"ACGTCTACGTA".as_slice(),
        &local_config(),
    )
    .unwrap();

    assert_eq!(result.score().unwrap(), 11);
    let alignment = result.alignment().unwrap();
    assert_eq!(gapped(&alignment.seq1), "GTTTA");
    assert_eq!(gapped(&alignment.seq2), "GTCTA");
    assert_eq!(result.begin_position().unwrap(), Coordinate::new(5, 2));
    assert_eq!(result.end_position().unwrap(), Coordinate::new(10, 7));
}

#[test]
fn swapping_the_inputs_swaps_roles_and_coordinates() {
    let result = align_pair(
        b"ACGTCTACGTA".as_slice(),
        b"AACCGGTTTAACCGGTT".as_slice(),
        &local_config(),
    )
    .unwrap();

    assert_eq!(result.score().unwrap(), 11);
    let alignment = result.alignment().unwrap();
    assert_eq!(gapped(&alignment.seq1), "GTCTA");
    assert_eq!(gapped(&alignment.seq2), "GTTTA");
    assert_eq!(result.begin_position().unwrap(), Coordinate::new(2, 5));
    assert_eq!(result.end_position().unwrap(), Coordinate::new(7, 10));
}

#[test]
fn score_only_results_refuse_alignment_access() {
    let config = AlignConfig::builder()
        .with_method(Method::Local)
        .with_scoring(SimpleScoring::new(4, -5))
        .with_gap(GapScheme::new(-10, -1))
        .with_output(Output::Score)
        .build()
        .unwrap();
    let result = align_pair(
        b"AACCGGTTTAACCGGTT".as_slice(),
        b"ACGTCTACGTA".as_slice(),
        &config,
    )
    .unwrap();

    assert_eq!(result.score().unwrap(), 11);
    assert!(matches!(
        result.alignment(),
        Err(AlignError::UnsupportedOutput {
            output: Output::Alignment
        })
    ));
    assert!(matches!(
        result.sequence1_id(),
        Err(AlignError::UnsupportedOutput { .. })
    ));
}

#[test]
fn end_position_without_alignment_matches_full_run() {
    let config = AlignConfig::builder()
        .with_method(Method::Local)
        .with_scoring(SimpleScoring::new(4, -5))
        .with_gap(GapScheme::new(-10, -1))
        .with_outputs(Output::Score | Output::EndPosition)
        .build()
        .unwrap();
    let result = align_pair(
        b"AACCGGTTTAACCGGTT".as_slice(),
        b"ACGTCTACGTA".as_slice(),
        &config,
    )
    .unwrap();

    assert_eq!(result.end_position().unwrap(), Coordinate::new(10, 7));
    assert!(result.begin_position().is_err());
}

#[test]
fn global_alignment_with_typed_alphabet() {
    let seq1 = pairalign::alphabet::parse::<Dna4>("ACGTT").unwrap();
    let seq2 = pairalign::alphabet::parse::<Dna4>("AGTTA").unwrap();
    let config = AlignConfig::builder()
        .with_scoring(SimpleScoring::edit())
        .with_gap(GapScheme::linear(-1))
        .build()
        .unwrap();

    let result = align_pair(&seq1, &seq2, &config).unwrap();
    assert_eq!(result.score().unwrap(), -2);
    assert_eq!(result.begin_position().unwrap(), Coordinate::new(0, 0));
    assert_eq!(result.end_position().unwrap(), Coordinate::new(5, 5));
    let alignment: &Alignment<Dna4> = result.alignment().unwrap();
    assert_eq!(alignment.rescore(config.scoring(), config.gap()), -2);
}

#[test]
fn free_end_gaps_skip_overhangs() {
    let config = AlignConfig::builder()
        .with_scoring(SimpleScoring::new(2, -3))
        .with_gap(GapScheme::new(-4, -1))
        .with_end_gaps(EndGaps::all())
        .build()
        .unwrap();

    let result = align_pair(b"TTTTACGTACGT".as_slice(), b"ACGTACGTGGGG".as_slice(), &config)
        .unwrap();
    assert_eq!(result.score().unwrap(), 16);
    assert_eq!(result.begin_position().unwrap(), Coordinate::new(4, 0));
    assert_eq!(result.end_position().unwrap(), Coordinate::new(12, 8));
}

#[test]
fn protein_alignment_with_blosum62() {
    let seq = pairalign::alphabet::parse::<pairalign::AminoAcid>("HEAGAWGHEE").unwrap();
    let config = AlignConfig::builder()
        .with_method(Method::Local)
        .with_scoring(MatrixScoring::<pairalign::AminoAcid>::blosum62())
        .with_gap(GapScheme::new(-10, -1))
        .build()
        .unwrap();

    let result = align_pair(&seq, &seq, &config).unwrap();
    let alignment = result.alignment().unwrap();
    assert_eq!(alignment.len(), seq.len());
    assert_eq!(
        alignment.rescore(config.scoring(), config.gap()),
        result.score().unwrap()
    );
}

#[test]
fn infeasible_band_is_reported_per_pair() {
    let config = AlignConfig::builder()
        .with_scoring(SimpleScoring::edit())
        .with_band(Band::new(2, 4))
        .with_execution(Execution::with_threads(2))
        .build()
        .unwrap();
    let pairs = vec![
        (b"ACGT".to_vec(), b"ACGT".to_vec()),
        (b"AACGT".to_vec(), b"ACG".to_vec()),
    ];

    let results: Vec<_> = align_pairwise(pairs, config)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(results.len(), 2);
    for result in &results {
        assert!(!result.is_valid());
        assert_eq!(result.score().unwrap(), INVALID_SCORE);
        assert!(matches!(
            result.alignment(),
            Err(AlignError::NoValidAlignment { .. })
        ));
    }
    assert_eq!(results[1].pair_index(), 1);
}

#[test]
fn minimum_score_invalidates_weak_pairs() {
    let config = AlignConfig::builder()
        .with_method(Method::Local)
        .with_scoring(SimpleScoring::new(4, -5))
        .with_gap(GapScheme::new(-10, -1))
        .with_min_score(12)
        .build()
        .unwrap();
    let result = align_pair(
        b"AACCGGTTTAACCGGTT".as_slice(),
        b"ACGTCTACGTA".as_slice(),
        &config,
    )
    .unwrap();

    assert!(!result.is_valid());
    assert_eq!(result.score().unwrap(), INVALID_SCORE);
}

#[test]
fn sequence_ids_come_from_labels_or_pair_index() {
    let config = AlignConfig::builder()
        .with_scoring(SimpleScoring::edit())
        .with_outputs(Output::Score | Output::SequenceIds)
        .build()
        .unwrap();
    let pairs = vec![
        (
            Labeled::new("chr1", b"ACGT".to_vec()),
            Labeled::new("read7", b"AGT".to_vec()),
        ),
        (Labeled::new("chr2", b"A".to_vec()), Labeled::new("read9", b"A".to_vec())),
    ];

    let results: Vec<_> = align_pairwise(pairs, config)
        .unwrap()
        .map(Result::unwrap)
        .collect();
    assert_eq!(results[0].sequence1_id().unwrap(), "chr1");
    assert_eq!(results[0].sequence2_id().unwrap(), "read7");
    assert_eq!(results[1].sequence2_id().unwrap(), "read9");

    let config = AlignConfig::builder()
        .with_scoring(SimpleScoring::edit())
        .with_outputs(Output::Score | Output::SequenceIds)
        .build()
        .unwrap();
    let pairs = vec![(b"AC".to_vec(), b"AC".to_vec()), (b"G".to_vec(), b"G".to_vec())];
    let results: Vec<_> = align_pairwise(pairs, config)
        .unwrap()
        .map(Result::unwrap)
        .collect();
    assert_eq!(results[1].sequence1_id().unwrap(), "1");
}

#[test]
fn oversized_matrices_fail_without_stopping_the_batch() {
    let config = AlignConfig::builder()
        .with_scoring(SimpleScoring::edit())
        .with_max_cells(30)
        .build()
        .unwrap();
    let pairs = vec![
        (b"ACGT".to_vec(), b"ACGT".to_vec()),
        (b"ACGTACGT".to_vec(), b"ACGTACGT".to_vec()),
        (b"AC".to_vec(), b"AC".to_vec()),
    ];

    let results: Vec<_> = align_pairwise(pairs, config).unwrap().collect();
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(AlignError::SequenceTooLarge { cells: 81, limit: 30 })
    ));
    assert_eq!(results[2].as_ref().unwrap().score().unwrap(), 0);
}

#[test]
fn invalid_configurations_fail_before_any_work() {
    let local_free_ends = AlignConfig::builder()
        .with_method(Method::Local)
        .with_scoring(SimpleScoring::edit())
        .with_end_gaps(EndGaps::all())
        .build();
    assert!(matches!(local_free_ends, Err(AlignError::Configuration(_))));

    let inverted = AlignConfig::builder()
        .with_scoring(SimpleScoring::edit())
        .with_band(Band::new(3, -3))
        .build();
    assert!(matches!(inverted, Err(AlignError::Configuration(_))));

    let duplicated = AlignConfig::builder()
        .with_scoring(SimpleScoring::edit())
        .with_method(Method::Global)
        .with_method(Method::Local)
        .build();
    assert!(matches!(duplicated, Err(AlignError::Configuration(_))));

    let no_threads = AlignConfig::builder()
        .with_scoring(SimpleScoring::edit())
        .with_execution(Execution::with_threads(0))
        .build();
    assert!(matches!(no_threads, Err(AlignError::Configuration(_))));
}
