use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, io, path::Path, str::FromStr};
use tracing::debug;

use crate::naming::reduce_name;
use crate::record::{read_records_file, write_records_file, KeyValue};

/// Orden total de claves que usa el reduce para agrupar y escribir.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyOrder {
    Ascending,
    /// Orden histórico del reduce: claves de mayor a menor.
    #[default]
    Descending,
}

impl KeyOrder {
    fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            KeyOrder::Ascending => a.cmp(b),
            KeyOrder::Descending => b.cmp(a),
        }
    }
}

impl FromStr for KeyOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(KeyOrder::Ascending),
            "desc" | "descending" => Ok(KeyOrder::Descending),
            other => Err(format!("orden de claves desconocido: {other}")),
        }
    }
}

/// Parámetros de una tarea reduce.
#[derive(Debug, Clone)]
pub struct ReduceTask<'a> {
    pub work_dir: &'a Path,
    pub job_name: &'a str,
    pub reduce_task: usize,
    pub n_map: usize,
    pub out_file: &'a Path,
    pub order: KeyOrder,
}

/// Agrupa registros consecutivos con la misma clave y aplica `reduce_f`.
/// La entrada ya tiene que venir ordenada; una entrada vacía no produce nada.
pub fn group_and_reduce<F>(sorted: Vec<KeyValue>, reduce_f: F) -> Vec<KeyValue>
where
    F: Fn(&str, &[String]) -> String,
{
    let mut out = Vec::new();
    let mut iter = sorted.into_iter();

    let Some(first) = iter.next() else {
        return out;
    };

    let mut current_key = first.key;
    let mut values = vec![first.value];

    for kv in iter {
        if kv.key != current_key {
            let value = reduce_f(&current_key, &values);
            out.push(KeyValue {
                key: std::mem::replace(&mut current_key, kv.key),
                value,
            });
            values.clear();
        }
        values.push(kv.value);
    }

    let value = reduce_f(&current_key, &values);
    out.push(KeyValue {
        key: current_key,
        value,
    });

    out
}

/// Ejecuta una tarea reduce completa:
/// 1. lee el archivo intermedio de cada map (todos tienen que existir)
/// 2. ordena por clave (sort estable: los valores conservan el orden archivo→registro)
/// 3. llama a `reduce_f` una vez por clave distinta
/// 4. escribe un registro por clave en `out_file`
///
/// Cualquier error de lectura, decodificación o escritura aborta la tarea.
pub fn do_reduce<F>(task: &ReduceTask<'_>, reduce_f: F) -> io::Result<usize>
where
    F: Fn(&str, &[String]) -> String,
{
    let mut records: Vec<KeyValue> = Vec::new();

    for m in 0..task.n_map {
        let path = task
            .work_dir
            .join(reduce_name(task.job_name, m, task.reduce_task));
        let mut part = read_records_file(&path)?;
        records.append(&mut part);
    }

    let order = task.order;
    records.sort_by(|a, b| order.compare(&a.key, &b.key));

    let output = group_and_reduce(records, reduce_f);
    write_records_file(task.out_file, &output)?;

    debug!(
        "reduce {} del job {}: {} claves escritas en {}",
        task.reduce_task,
        task.job_name,
        output.len(),
        task.out_file.display()
    );

    Ok(output.len())
}
