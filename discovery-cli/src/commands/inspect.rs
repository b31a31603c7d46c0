use anyhow::Result;
use std::fmt::Write;
use std::path::Path;

use discovery::{AggregationDecoder, QueryAggregation};

use super::input::{load_payload, Payload};

/// Buckets shown per aggregation before eliding the rest
const MAX_BUCKETS: usize = 10;

/// Run inspect command on a saved payload
pub fn run_inspect(path: &Path, decoder: &AggregationDecoder) -> Result<()> {
    let payload = load_payload(path, decoder)?;

    println!();
    println!("================================================================================");
    println!("Payload: {}", path.display());
    println!("================================================================================");

    if let Payload::Response(response) = &payload {
        println!();
        println!("Summary");
        println!("--------------------------------------------------------------------------------");
        if let Some(n) = response.matching_results {
            println!("  Matching results:   {}", n);
        }
        println!("  Results returned:   {}", response.results.len());
        println!("  Passages:           {}", response.passages.len());
        if let Some(q) = &response.suggested_query {
            println!("  Suggested query:    {}", q);
        }
    }

    if let Payload::Notices(response) = &payload {
        let notices = response.results.iter().map(|r| r.notices.len()).sum::<usize>();
        println!();
        println!("Summary");
        println!("--------------------------------------------------------------------------------");
        if let Some(n) = response.matching_results {
            println!("  Matching results:   {}", n);
        }
        println!("  Documents returned: {}", response.results.len());
        println!("  Notices:            {}", notices);
        for result in &response.results {
            for notice in &result.notices {
                println!(
                    "    {} [{}] {}",
                    result.id.as_deref().unwrap_or("-"),
                    notice
                        .severity
                        .map(|s| format!("{:?}", s).to_lowercase())
                        .unwrap_or_else(|| "-".to_string()),
                    notice.notice_id.as_deref().unwrap_or("-")
                );
            }
        }
    }

    let aggs = payload.aggregations();
    let total = aggs.iter().map(count_nodes).sum::<usize>();
    let unknown = aggs
        .iter()
        .map(|a| {
            let mut n = 0;
            a.walk(&mut |node, _| {
                if !node.is_known() {
                    n += 1;
                }
            });
            n
        })
        .sum::<usize>();

    println!();
    println!(
        "Aggregations ({} top-level, {} total, {} unknown)",
        aggs.len(),
        total,
        unknown
    );
    println!("--------------------------------------------------------------------------------");
    print!("{}", render_tree(aggs));
    println!();

    Ok(())
}

fn count_nodes(agg: &QueryAggregation) -> usize {
    let mut n = 0;
    agg.walk(&mut |_, _| n += 1);
    n
}

/// Indented tree of aggregations and their buckets.
pub fn render_tree(aggs: &[QueryAggregation]) -> String {
    let mut out = String::new();
    for agg in aggs {
        render_node(&mut out, agg, 1);
    }
    out
}

fn render_node(out: &mut String, agg: &QueryAggregation, level: usize) {
    let indent = "  ".repeat(level);
    let marker = if agg.is_known() { "" } else { " [unknown]" };
    let _ = writeln!(out, "{}{}{}", indent, agg, marker);

    for child in agg.aggregations() {
        render_node(out, child, level + 1);
    }

    let buckets = agg.buckets();
    for bucket in buckets.iter().take(MAX_BUCKETS) {
        match bucket.matching_results() {
            Some(n) => {
                let _ = writeln!(out, "{}  - {}: {}", indent, bucket.key_label(), n);
            }
            None => {
                let _ = writeln!(out, "{}  - {}", indent, bucket.key_label());
            }
        }
        for child in bucket.aggregations() {
            render_node(out, child, level + 2);
        }
    }
    if buckets.len() > MAX_BUCKETS {
        let _ = writeln!(out, "{}  ... {} more", indent, buckets.len() - MAX_BUCKETS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_nested_tree() {
        let agg = AggregationDecoder::default()
            .decode(json!({
                "type": "nested",
                "path": "enriched_text.entities",
                "matching_results": 4,
                "aggregations": [{
                    "type": "term",
                    "field": "enriched_text.entities.text",
                    "count": 2,
                    "results": [
                        {"key": "IBM", "matching_results": 3},
                        {"key": "Watson", "matching_results": 1}
                    ]
                }]
            }))
            .unwrap();

        let rendered = render_tree(&[agg]);
        assert_eq!(
            rendered,
            "  nested(enriched_text.entities), 4 matching\n    \
             term(enriched_text.entities.text) count=2\n      \
             - IBM: 3\n      \
             - Watson: 1\n"
        );
    }

    #[test]
    fn test_render_marks_unknown() {
        let agg = AggregationDecoder::default()
            .decode(json!({"type": "clustering"}))
            .unwrap();
        assert_eq!(render_tree(&[agg]), "  clustering [unknown]\n");
    }

    #[test]
    fn test_render_elides_buckets() {
        let results: Vec<_> = (0..12)
            .map(|i| json!({"key": i * 10, "matching_results": 1}))
            .collect();
        let agg = AggregationDecoder::default()
            .decode(json!({"type": "histogram", "field": "year", "interval": 10, "results": results}))
            .unwrap();

        let rendered = render_tree(&[agg]);
        assert!(rendered.contains("  - 90: 1"));
        assert!(!rendered.contains("  - 100: 1"));
        assert!(rendered.ends_with("... 2 more\n"));
    }
}
