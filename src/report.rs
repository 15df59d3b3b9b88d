//! §6 Reporter: the one-line-per-completed-file summary format.

/// Render a completed slot's result to the exact line format from §6:
/// `<filename>: sectors = <total> score = <S> by sector = <per-sector string>`
pub fn format_report(filename: &str, total_sectors: u64, scores: &[u8]) -> String {
    let mean = mean_score(scores);
    let summary = if mean == 10 {
        "*".to_string()
    } else {
        mean.to_string()
    };

    let per_sector: String = scores.iter().map(|&s| sector_char(s)).collect();

    format!(
        "{filename}: sectors = {total_sectors} score = {summary} by sector = {per_sector}"
    )
}

pub fn emit(filename: &str, total_sectors: u64, scores: &[u8]) {
    println!("{}", format_report(filename, total_sectors, scores));
}

fn sector_char(score: u8) -> char {
    match score {
        0..=9 => (b'0' + score) as char,
        10 => '*',
        _ => unreachable!("score bucket out of range: {score}"),
    }
}

/// Integer truncated mean of the score vector. An empty vector (a pattern
/// file with zero full sectors) reports mean 0.
fn mean_score(scores: &[u8]) -> u8 {
    if scores.is_empty() {
        return 0;
    }

    let sum: u32 = scores.iter().map(|&s| s as u32).sum();
    (sum / scores.len() as u32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_renders_stars() {
        let line = format_report("p", 1, &[10]);
        assert_eq!(line, "p: sectors = 1 score = * by sector = *");
    }

    #[test]
    fn all_zero_pattern_renders_zeroes() {
        let line = format_report("p", 8, &[0; 8]);
        assert_eq!(
            line,
            "p: sectors = 8 score = 0 by sector = 00000000"
        );
    }

    #[test]
    fn mixed_scores_render_digits_and_stars() {
        let line = format_report("p", 3, &[10, 4, 7]);
        assert_eq!(line, "p: sectors = 3 score = 7 by sector = *47");
    }

    #[test]
    fn empty_score_vector_reports_zero() {
        let line = format_report("p", 0, &[]);
        assert_eq!(line, "p: sectors = 0 score = 0 by sector = ");
    }
}
