//! Rupiah formatting for customer-facing messages.

/// Format an amount as "Rp1.234.567" (Indonesian grouping, no decimals).
pub fn format_rupiah(amount: f64) -> String {
    let whole = amount.round() as i64;
    let negative = whole < 0;
    let digits = whole.abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if negative {
        format!("-Rp{}", grouped)
    } else {
        format!("Rp{}", grouped)
    }
}
