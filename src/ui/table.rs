use tabled::{settings::Style, Table, Tabled};
use crate::query::{NamedCount, NamedSalary, YearSalary};

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Jobs")]
    count: i64,
}

#[derive(Tabled)]
struct SalaryRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Avg salary")]
    salary: String,
}

fn render<T: Tabled>(rows: Vec<T>) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn counts_table(rows: &[NamedCount]) -> String {
    render(
        rows.iter()
            .map(|r| CountRow { name: r.name.clone(), count: r.count })
            .collect(),
    )
}

pub fn trend_table(rows: &[YearSalary]) -> String {
    render(
        rows.iter()
            .map(|r| SalaryRow { group: r.year.to_string(), salary: format_usd(r.salary) })
            .collect(),
    )
}

pub fn experience_table(rows: &[NamedSalary]) -> String {
    render(
        rows.iter()
            .map(|r| SalaryRow { group: r.name.clone(), salary: format_usd(r.salary) })
            .collect(),
    )
}

/// `1234567` -> `$1,234,567`
pub fn format_usd(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}
