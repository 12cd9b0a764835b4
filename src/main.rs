use log::info;
use pairalign::{
    align_pairwise, AlignConfig, Execution, GapScheme, Labeled, Method, SimpleScoring,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let pairs: Vec<(Labeled<Vec<u8>>, Labeled<Vec<u8>>)> = match args.as_slice() {
        [a, b] => vec![(
            Labeled::new("seq1", a.as_bytes().to_vec()),
            Labeled::new("seq2", b.as_bytes().to_vec()),
        )],
        _ => vec![
            (
                Labeled::new("ref", b"AACCGGTTTAACCGGTT".to_vec()),
                Labeled::new("query", b"ACGTCTACGTA".to_vec()),
            ),
            (
                Labeled::new("ref", b"ACGTACGT".to_vec()),
                Labeled::new("query", b"ACGTAGCT".to_vec()),
            ),
        ],
    };

    let config = AlignConfig::builder()
        .with_method(Method::Local)
        .with_scoring(SimpleScoring::new(4, -5))
        .with_gap(GapScheme::new(-10, -1))
        .with_execution(Execution::parallel())
        .build()?;
    info!("aligning {} pairs with {:?}", pairs.len(), config.execution());

    for result in align_pairwise(pairs, config)? {
        let result = result?;
        if !result.is_valid() {
            println!("pair {}: no valid alignment", result.pair_index());
            continue;
        }
        let begin = result.begin_position()?;
        let end = result.end_position()?;
        println!(
            "{} vs {}: score {} [{}..{}) x [{}..{})",
            result.sequence1_id()?,
            result.sequence2_id()?,
            result.score()?,
            begin.column,
            end.column,
            begin.row,
            end.row,
        );
        print!("{}", result.alignment()?);
    }

    Ok(())
}
