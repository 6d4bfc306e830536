use fnv::FnvHasher;
use std::{
    collections::BTreeMap,
    fs,
    hash::Hasher,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::naming::{final_name, merge_name, reduce_name};
use crate::record::{read_records_file, write_file_atomic, write_records_file, KeyValue};

/// Hash de partición: FNV-1a sobre los bytes de la clave, sin bit de signo.
/// Master y workers tienen que usar exactamente el mismo.
pub fn ihash(key: &str) -> u32 {
    let mut h = FnvHasher::default();
    h.write(key.as_bytes());
    (h.finish() & 0x7fff_ffff) as u32
}

/// Bucket de reduce al que va una clave.
pub fn partition_for(key: &str, n_reduce: usize) -> usize {
    ihash(key) as usize % n_reduce
}

/* =========================
   Fase map
   ========================= */

/// Ejecuta una tarea map:
///   - lee `in_file` y llama a `map_f(nombre, contenido)`
///   - reparte cada registro en `reduce_name(job, map_task, r)` según hash(clave)
///
/// Escribe siempre los `n_reduce` archivos, aunque queden vacíos: el reduce
/// exige que existan todos.
pub fn do_map<F>(
    work_dir: &Path,
    job_name: &str,
    map_task: usize,
    in_file: &Path,
    n_reduce: usize,
    map_f: F,
) -> io::Result<()>
where
    F: Fn(&str, &str) -> Vec<KeyValue>,
{
    if n_reduce == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "n_reduce tiene que ser mayor que cero",
        ));
    }

    let contents = fs::read_to_string(in_file).map_err(|e| {
        io::Error::new(e.kind(), format!("no se pudo leer {}: {e}", in_file.display()))
    })?;

    let file_name = in_file.to_string_lossy();
    let mut buckets: Vec<Vec<KeyValue>> = vec![Vec::new(); n_reduce];
    for kv in map_f(&file_name, &contents) {
        let r = partition_for(&kv.key, n_reduce);
        buckets[r].push(kv);
    }

    for (r, bucket) in buckets.iter().enumerate() {
        let path = work_dir.join(reduce_name(job_name, map_task, r));
        write_records_file(&path, bucket)?;
    }

    debug!(
        "map {} del job {}: {} repartido en {} buckets",
        map_task,
        job_name,
        in_file.display(),
        n_reduce
    );
    Ok(())
}

/* =========================
   Merge final de las salidas de reduce
   ========================= */

/// Junta las salidas de los `n_reduce` reduce en un solo archivo
/// `clave: valor` ordenado por clave. Devuelve la ruta escrita.
pub fn merge_outputs(work_dir: &Path, job_name: &str, n_reduce: usize) -> io::Result<PathBuf> {
    let mut kvs: BTreeMap<String, String> = BTreeMap::new();

    for r in 0..n_reduce {
        let path = work_dir.join(merge_name(job_name, r));
        for kv in read_records_file(&path)? {
            kvs.insert(kv.key, kv.value);
        }
    }

    let out_path = work_dir.join(final_name(job_name));
    write_file_atomic(&out_path, |writer| {
        for (key, value) in &kvs {
            writeln!(writer, "{}: {}", key, value)?;
        }
        Ok(())
    })?;

    Ok(out_path)
}

/// Borra los archivos intermedios y las salidas parciales de un job.
/// Los que ya no existen se ignoran.
pub fn cleanup_intermediate(
    work_dir: &Path,
    job_name: &str,
    n_map: usize,
    n_reduce: usize,
) -> io::Result<()> {
    let mut to_remove = Vec::new();
    for r in 0..n_reduce {
        for m in 0..n_map {
            to_remove.push(work_dir.join(reduce_name(job_name, m, r)));
        }
        to_remove.push(work_dir.join(merge_name(job_name, r)));
    }

    for path in to_remove {
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
