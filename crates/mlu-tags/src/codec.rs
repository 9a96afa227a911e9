//! Convenciones de valores compartidas por todos los traductores.
//!
//! Un valor nativo puede estar ausente, tener un solo elemento o varios. En el
//! registro canónico siempre es un único `String`: los valores múltiples se
//! unen con `;` y la ausencia se representa con `""`.

use std::str::FromStr;

/// Separador de valores múltiples en el registro canónico.
pub const VALUE_SEPARATOR: char = ';';

/// Separador de los pares "número/total" en texto (`TRCK`, `TPOS`).
pub const PAIR_SEPARATOR: char = '/';

/// Une una secuencia de valores con `;`. Una secuencia vacía produce `""`.
pub fn join_values<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, value) in values.into_iter().enumerate() {
        if i > 0 {
            out.push(VALUE_SEPARATOR);
        }
        out.push_str(value.as_ref());
    }
    out
}

/// Regla de decodificación nativo → canónico.
pub fn decode_values<S: AsRef<str>>(values: Option<&[S]>) -> String {
    match values {
        None => String::new(),
        Some([single]) => single.as_ref().to_string(),
        Some(many) => join_values(many),
    }
}

/// Separa un valor canónico en sus elementos, convirtiendo cada uno a `T`.
///
/// `split_values::<String>` nunca falla; con `i64` o `f64` devuelve el primer
/// error de conversión.
pub fn split_values<T: FromStr>(value: &str) -> Result<Vec<T>, T::Err> {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    value.split(VALUE_SEPARATOR).map(str::parse).collect()
}

/// `(3, 12)` → `("3", "12")`. Un cero se representa como `""`.
pub fn format_number_pair(number: u32, total: u32) -> (String, String) {
    let render = |n: u32| if n == 0 { String::new() } else { n.to_string() };
    (render(number), render(total))
}

/// `"3/12"` → `("3", "12")`; `"3"` → `("3", "")`.
pub fn split_slash_pair(value: &str) -> (String, String) {
    match value.split_once(PAIR_SEPARATOR) {
        Some((number, total)) => {
            let total = total.split(PAIR_SEPARATOR).next().unwrap_or_default();
            (number.to_string(), total.to_string())
        }
        None => (value.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_joins_multiple_values_in_order() {
        let values = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(decode_values(Some(values.as_slice())), "a;b;c");
    }

    #[test]
    fn decode_absent_or_empty_is_empty_string() {
        assert_eq!(decode_values::<String>(None), "");
        assert_eq!(decode_values::<String>(Some(&[][..])), "");
    }

    #[test]
    fn decode_single_value_adds_no_separator() {
        assert_eq!(decode_values(Some(&["Only"][..])), "Only");
        assert_eq!(decode_values(Some(&[""][..])), "");
    }

    #[test]
    fn join_of_nothing_is_empty() {
        assert_eq!(join_values(Vec::<String>::new()), "");
        assert_eq!(join_values(["1", "2"]), "1;2");
    }

    #[test]
    fn split_values_as_strings() {
        assert_eq!(split_values::<String>("a;b").unwrap(), vec!["a", "b"]);
        assert!(split_values::<String>("").unwrap().is_empty());
    }

    #[test]
    fn split_values_coerces_numbers() {
        assert_eq!(split_values::<i64>("1;20;300").unwrap(), vec![1, 20, 300]);
        assert_eq!(split_values::<f64>("1.5;2").unwrap(), vec![1.5, 2.0]);
        assert!(split_values::<i64>("1;x").is_err());
    }

    #[test]
    fn number_pair_renders_zero_as_empty() {
        assert_eq!(format_number_pair(3, 12), ("3".into(), "12".into()));
        assert_eq!(format_number_pair(3, 0), ("3".into(), String::new()));
        assert_eq!(format_number_pair(0, 0), (String::new(), String::new()));
    }

    #[test]
    fn slash_pair_without_total() {
        assert_eq!(split_slash_pair("3/12"), ("3".into(), "12".into()));
        assert_eq!(split_slash_pair("7"), ("7".into(), String::new()));
        assert_eq!(split_slash_pair(""), (String::new(), String::new()));
        assert_eq!(split_slash_pair("1/2/3"), ("1".into(), "2".into()));
    }
}
