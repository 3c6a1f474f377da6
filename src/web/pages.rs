//! Server-rendered pages for the two forms.

use crate::core::SingleLookup;
use crate::domain::{AnnotationRecord, FrequencyRecord};

pub const NOT_CONVERTED_MESSAGE: &str = "Could not convert these coordinates.";
pub const VARIANT_NOT_FOUND_MESSAGE: &str = "Variant not found in gnomAD data.";

#[derive(Debug, Default)]
pub struct ConverterView<'a> {
    pub lookup: Option<&'a SingleLookup>,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct FrequencyView<'a> {
    pub record: Option<&'a FrequencyRecord>,
    pub not_found: bool,
    pub error: Option<String>,
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<nav><a href="/">Coordinate converter</a> | <a href="/frequency">Allele frequency</a></nav>
<h1>{title}</h1>
{body}
</body>
</html>
"#,
        title = escape(title),
        body = body
    )
}

fn error_block(error: &Option<String>) -> String {
    match error {
        Some(message) => format!("<p class=\"error\">{}</p>\n", escape(message)),
        None => String::new(),
    }
}

const DIRECTION_SELECT: &str = r#"<select name="conversion_type">
<option value="37_to_38">GRCh37 (hg19) → GRCh38 (hg38)</option>
<option value="38_to_37">GRCh38 (hg38) → GRCh37 (hg19)</option>
</select>"#;

fn annotation_rows(prefix: &str, annotation: &AnnotationRecord) -> String {
    format!(
        "<tr><th>{prefix} genes</th><td>{}</td></tr>\n<tr><th>{prefix} variants</th><td>{}</td></tr>\n",
        escape(&annotation.gene_names_display()),
        escape(&annotation.variant_ids_display()),
        prefix = prefix
    )
}

fn lookup_block(lookup: &SingleLookup) -> String {
    let conversion = &lookup.conversion;
    let Some(target) = &conversion.target else {
        return format!("<p class=\"error\">{}</p>\n", NOT_CONVERTED_MESSAGE);
    };

    let mut rows = format!(
        "<tr><th>Conversion</th><td>{}</td></tr>\n\
         <tr><th>Original</th><td>{}</td></tr>\n\
         <tr><th>Converted</th><td>{}</td></tr>\n",
        escape(lookup.direction.label()),
        escape(&conversion.source.to_string()),
        escape(&target.to_string())
    );
    if conversion.candidates.len() > 1 {
        let others: Vec<String> = conversion.candidates[1..]
            .iter()
            .map(|c| c.to_string())
            .collect();
        rows.push_str(&format!(
            "<tr><th>Other candidates</th><td>{}</td></tr>\n",
            escape(&others.join(", "))
        ));
    }
    if let Some(annotation) = &lookup.original_annotation {
        rows.push_str(&annotation_rows("Original", annotation));
    }
    if let Some(annotation) = &lookup.converted_annotation {
        rows.push_str(&annotation_rows("Converted", annotation));
    }

    format!("<table class=\"result\">\n{}</table>\n", rows)
}

pub fn converter_page(view: &ConverterView<'_>) -> String {
    let mut body = String::new();
    body.push_str(&error_block(&view.error));
    if let Some(lookup) = view.lookup {
        body.push_str(&lookup_block(lookup));
    }

    body.push_str(&format!(
        r#"<h2>Single coordinate</h2>
<form method="post" action="/convert">
<label>Chromosome <input name="chromosome" required></label>
<label>Position <input name="position" required></label>
{select}
<label><input type="checkbox" name="annotate_original" value="on"> Annotate original coordinate too</label>
<button type="submit">Convert</button>
</form>
<h2>Batch file</h2>
<form method="post" action="/batch" enctype="multipart/form-data">
<input type="file" name="file" accept=".csv,.txt,.tsv" required>
{select}
<button type="submit">Convert file</button>
</form>
<p>Files need <code>chromosome</code> and <code>position</code> columns (.csv comma separated, .txt/.tsv tab separated).</p>
"#,
        select = DIRECTION_SELECT
    ));

    layout("Genome build coordinate converter", &body)
}

pub fn frequency_page(view: &FrequencyView<'_>) -> String {
    let mut body = String::new();
    body.push_str(&error_block(&view.error));
    if view.not_found {
        body.push_str(&format!("<p class=\"error\">{}</p>\n", VARIANT_NOT_FOUND_MESSAGE));
    }
    if let Some(record) = view.record {
        body.push_str(&format!(
            "<table class=\"result\">\n\
             <tr><th>Variant</th><td>{}</td></tr>\n\
             <tr><th>Genome AF</th><td>{}</td></tr>\n\
             <tr><th>Exome AF</th><td>{}</td></tr>\n\
             </table>\n",
            escape(&record.variant_id),
            record.genome_af,
            record.exome_af
        ));
    }

    body.push_str(
        r#"<form method="post" action="/frequency">
<label>Gene symbol <input name="gene_symbol" required></label>
<label>Position (GRCh38) <input name="position" required></label>
<label>Ref <input name="ref_allele" required></label>
<label>Alt <input name="alt_allele" required></label>
<button type="submit">Look up</button>
</form>
"#,
    );

    layout("gnomAD allele frequency", &body)
}
