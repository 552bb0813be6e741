// report/table.rs
// Fixed-width text tables

use chrono::NaiveDateTime;

pub struct TextTable {
    title: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new(title: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            title: title.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Short rows are padded with blanks, extra cells are dropped.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells
            .into_iter()
            .map(Into::into)
            .take(self.headers.len())
            .collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        out.push_str(&format!("== {} ==\n", self.title));
        out.push_str(&format_line(&self.headers, &widths));
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&format_line(&rule, &widths));
        if self.rows.is_empty() {
            out.push_str("(no rows)\n");
        }
        for row in &self.rows {
            out.push_str(&format_line(row, &widths));
        }
        out
    }
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .collect();
    format!("{}\n", padded.join("  ").trim_end())
}

pub fn fmt_amount(v: f64) -> String {
    format!("{:.6}", v)
}

pub fn fmt_usd(v: f64) -> String {
    format!("{:.2}", v)
}

pub fn fmt_pct(v: f64) -> String {
    format!("{:.2}%", v)
}

pub fn fmt_opt(v: Option<f64>) -> String {
    v.map(fmt_amount).unwrap_or_else(|| "-".to_string())
}

pub fn fmt_time(t: Option<NaiveDateTime>) -> String {
    t.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn fmt_text(s: Option<&str>) -> String {
    s.unwrap_or("-").to_string()
}
