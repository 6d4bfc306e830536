use crate::record::KeyValue;

/// Limpia un token: sólo alfanumérico y '_', en minúscula.
fn clean_token(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase()
}

/// map de WordCount: emite (palabra, "1") por cada palabra del contenido.
pub fn map_f(_file: &str, contents: &str) -> Vec<KeyValue> {
    contents
        .split_whitespace()
        .map(clean_token)
        .filter(|t| !t.is_empty())
        .map(|t| KeyValue::new(t, "1"))
        .collect()
}

/// reduce de WordCount: suma los valores. Lo que no parsea cuenta como 0.
pub fn reduce_f(_key: &str, values: &[String]) -> String {
    values
        .iter()
        .map(|v| v.trim().parse::<u64>().unwrap_or(0))
        .sum::<u64>()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_f_normaliza_y_saltea_puntuacion() {
        let out = map_f("in.txt", "Hola hola, mundo!!\n -- mundo_prueba");

        let keys: Vec<&str> = out.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, vec!["hola", "hola", "mundo", "mundo_prueba"]);
        assert!(out.iter().all(|kv| kv.value == "1"));
    }

    #[test]
    fn map_f_con_entrada_vacia_no_emite_nada() {
        assert!(map_f("vacio.txt", "").is_empty());
    }

    #[test]
    fn reduce_f_suma_e_ignora_basura() {
        let values = vec!["1".to_string(), "2".to_string(), "x".to_string(), " 4 ".to_string()];
        assert_eq!(reduce_f("k", &values), "7");
        assert_eq!(reduce_f("k", &[]), "0");
    }
}
