use crate::prelude::*;
use clap::ArgMatches;
use nu_ansi_term::Color;
use regex::Regex;
use std::collections::BTreeMap;

pub fn run(args: &ArgMatches) -> AbsintResult<()> {
    init_logger(args);

    let root = *args
        .get_one::<u32>("root")
        .ok_or_else(|| AbsintError::BadArguments("--root needed".to_string()))?;
    let edges: Vec<&str> = args
        .get_many::<String>("edge")
        .map(|values| values.map(String::as_str).collect())
        .unwrap_or_default();
    let successors = parse_edges(&edges)?;
    log::debug!("{} edges read", edges.len());

    let wto = WeakTopologicalOrdering::new(root, |node| {
        successors.get(&node).cloned().unwrap_or_default()
    });
    println!("{}", render(&wto, args.get_flag("color"))?);

    Ok(())
}

/// Builds the successors lists of a graph given as `A->B` edges.
pub fn parse_edges(edges: &[&str]) -> AbsintResult<BTreeMap<u32, Vec<u32>>> {
    let re = Regex::new(r"^\s*(\d+)\s*->\s*(\d+)\s*$")?;
    let mut successors: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for edge in edges {
        let (src, dst) = re
            .captures(edge)
            .and_then(|caps| Some((caps[1].parse().ok()?, caps[2].parse().ok()?)))
            .ok_or_else(|| AbsintError::BadArguments(format!("invalid edge '{edge}'")))?;
        successors.entry(src).or_default().push(dst);
    }
    Ok(successors)
}

/// Prints an ordering in Bourdoncle's parenthesized notation.
pub fn render(wto: &WeakTopologicalOrdering<u32>, color: bool) -> AbsintResult<String> {
    let mut parts = Vec::new();
    for component in wto.components() {
        parts.push(render_component(&component, color)?);
    }
    Ok(parts.join(" "))
}

fn render_component(component: &WtoComponent<'_, u32>, color: bool) -> AbsintResult<String> {
    let head = component.head_node().to_string();
    if component.is_vertex() {
        return Ok(head);
    }
    let mut parts = vec![if color {
        Color::Yellow.bold().paint(head).to_string()
    } else {
        head
    }];
    for sub in component.subcomponents()? {
        parts.push(render_component(&sub, color)?);
    }
    Ok(format!("({})", parts.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges() {
        let succs = parse_edges(&["1->2", " 2 -> 3 ", "1->3"]).unwrap();
        assert_eq!(succs[&1], vec![2, 3]);
        assert_eq!(succs[&2], vec![3]);
        assert!(matches!(
            parse_edges(&["1-2"]),
            Err(AbsintError::BadArguments(_))
        ));
        assert!(parse_edges(&["1->99999999999"]).is_err());
    }

    #[test]
    fn plain_rendering_matches_display() {
        let edges = [
            "1->2", "2->3", "3->4", "4->5", "5->6", "6->7", "7->8", "2->8", "4->7", "6->5",
            "7->3",
        ];
        let succs = parse_edges(&edges).unwrap();
        let wto = WeakTopologicalOrdering::new(1, |n| succs.get(&n).cloned().unwrap_or_default());
        assert_eq!(render(&wto, false).unwrap(), "1 2 (3 4 (5 6) 7) 8");
        assert_eq!(render(&wto, false).unwrap(), wto.to_string());
    }

    #[test]
    fn colored_heads() {
        let succs = parse_edges(&["1->1"]).unwrap();
        let wto = WeakTopologicalOrdering::new(1, |n| succs.get(&n).cloned().unwrap_or_default());
        let out = render(&wto, true).unwrap();
        assert!(out.starts_with('(') && out.ends_with(')'));
        assert!(out.contains("\u{1b}["));
    }
}
