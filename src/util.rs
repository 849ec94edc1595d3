/// PayPal expects amounts with exactly two decimals and a `.` separator.
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

/// Minor units to major units, the way capture and credit receive amounts.
pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// `application/x-www-form-urlencoded` serialization preserving pair order.
pub fn encode_form<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key.as_ref(), value.as_ref());
    }
    serializer.finish()
}
