//! Lizard complexity report parser
//!
//! Lizard's XML output is a table per measure type. Each `<item>` of the
//! file-level table holds its columns as ordered `<value>` elements:
//! `NR, NCSS, CCN, Functions`.

use serde::Serialize;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::xml::{XmlDocument, XmlElement, XmlReportParser};

const MEASURE: &str = "measure";
const ITEM: &str = "item";
const VALUE: &str = "value";
const FILE_MEASURE: &str = "file";

const COMPLEXITY_INDEX: usize = 2;
const FUNCTIONS_INDEX: usize = 3;

/// Complexity figures of one source file
///
/// Identity is the path alone.
#[derive(Debug, Clone, Eq, Serialize)]
pub struct LizardMeasure {
    path: String,
    complexity: u32,
    functions: u32,
}

impl LizardMeasure {
    pub fn new(path: &str, complexity: u32, functions: u32) -> Self {
        Self {
            path: path.to_string(),
            complexity,
            functions,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Cyclomatic complexity of the whole file
    pub fn complexity(&self) -> u32 {
        self.complexity
    }

    pub fn functions(&self) -> u32 {
        self.functions
    }
}

impl PartialEq for LizardMeasure {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Hash for LizardMeasure {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// Parses Lizard XML reports into per-file measures
#[derive(Debug, Clone, Copy, Default)]
pub struct LizardParser;

impl XmlReportParser for LizardParser {
    type Report = Vec<LizardMeasure>;

    fn parse_document(&self, document: &XmlDocument) -> Vec<LizardMeasure> {
        let items = document
            .elements_by_tag(MEASURE)
            .into_iter()
            .filter(|measure| measure.attribute_or_empty("type").eq_ignore_ascii_case(FILE_MEASURE))
            .flat_map(|measure| measure.children().iter().filter(|child| child.name() == ITEM));

        let mut measures: Vec<LizardMeasure> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        // A repeated path keeps its first position but takes the later figures
        for measure in items.filter_map(parse_item) {
            match positions.get(measure.path()) {
                Some(&position) => measures[position] = measure,
                None => {
                    positions.insert(measure.path.clone(), measures.len());
                    measures.push(measure);
                }
            }
        }

        measures
    }
}

fn parse_item(item: &XmlElement) -> Option<LizardMeasure> {
    let path = item.attribute_or_empty("name");
    let values: Vec<&XmlElement> = item
        .children()
        .iter()
        .filter(|child| child.name() == VALUE)
        .collect();

    let column = |index: usize| {
        values
            .get(index)
            .and_then(|value| value.text_content().trim().parse::<u32>().ok())
    };

    match (column(COMPLEXITY_INDEX), column(FUNCTIONS_INDEX)) {
        (Some(complexity), Some(functions)) => {
            Some(LizardMeasure::new(path, complexity, functions))
        }
        _ => {
            tracing::warn!(
                path,
                values = values.len(),
                "skipping complexity item with missing or invalid values"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<?xml version="1.0" ?>
<?xml-stylesheet type="text/xsl" href="https://raw.github.com/terryyin/lizard/master/lizard.xsl"?>
<cppncss>
    <measure type="Function">
        <labels>
            <label>Nr.</label>
            <label>NCSS</label>
            <label>CCN</label>
        </labels>
        <item name="viewDidLoad(...) at App/ViewController.m:12">
            <value>1</value>
            <value>8</value>
            <value>2</value>
        </item>
    </measure>
    <measure type="File">
        <labels>
            <label>Nr.</label>
            <label>NCSS</label>
            <label>CCN</label>
            <label>Functions</label>
        </labels>
        <item name="App/AppDelegate.m">
            <value>1</value>
            <value>29</value>
            <value>6</value>
            <value>4</value>
        </item>
        <item name="App/ViewController.m">
            <value>2</value>
            <value>40</value>
            <value>11</value>
            <value>5</value>
        </item>
        <average label="NCSS" value="34"/>
    </measure>
</cppncss>"#;

    #[test]
    fn test_parse_lizard() {
        let measures = LizardParser.parse_str(REPORT).unwrap();

        assert_eq!(measures.len(), 2);
        assert_eq!(measures[0].path(), "App/AppDelegate.m");
        assert_eq!(measures[0].complexity(), 6);
        assert_eq!(measures[0].functions(), 4);
        assert_eq!(measures[1].path(), "App/ViewController.m");
        assert_eq!(measures[1].complexity(), 11);
        assert_eq!(measures[1].functions(), 5);
    }

    #[test]
    fn test_function_measures_are_ignored() {
        let measures = LizardParser.parse_str(REPORT).unwrap();
        assert!(measures.iter().all(|m| !m.path().contains("viewDidLoad")));
    }

    #[test]
    fn test_repeated_path_keeps_later_values() {
        let xml = r#"<cppncss><measure type="file">
    <item name="A.m"><value>1</value><value>10</value><value>3</value><value>1</value></item>
    <item name="B.m"><value>2</value><value>10</value><value>1</value><value>1</value></item>
    <item name="A.m"><value>3</value><value>10</value><value>9</value><value>2</value></item>
</measure></cppncss>"#;

        let measures = LizardParser.parse_str(xml).unwrap();

        assert_eq!(measures.len(), 2);
        assert_eq!(measures[0].path(), "A.m");
        assert_eq!(measures[0].complexity(), 9);
        assert_eq!(measures[0].functions(), 2);
        assert_eq!(measures[1].path(), "B.m");
    }

    #[test]
    fn test_measure_identity_is_path_only() {
        assert_eq!(LizardMeasure::new("A.m", 3, 1), LizardMeasure::new("A.m", 9, 2));
        assert_ne!(LizardMeasure::new("A.m", 3, 1), LizardMeasure::new("B.m", 3, 1));
    }

    #[test]
    fn test_item_with_missing_values_is_skipped() {
        let xml = r#"<cppncss><measure type="file">
    <item name="Short.m"><value>1</value><value>10</value><value>3</value></item>
    <item name="Bad.m"><value>1</value><value>10</value><value>x</value><value>1</value></item>
    <item name="Good.m"><value>1</value><value>10</value><value>4</value><value>2</value></item>
</measure></cppncss>"#;

        let measures = LizardParser.parse_str(xml).unwrap();
        assert_eq!(measures.len(), 1);
        assert_eq!(measures[0].path(), "Good.m");
    }
}
