use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

// sufijo único de los temporales dentro del proceso
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Par clave/valor que producen los map y consumen los reduce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Escribe los registros como un objeto JSON por línea, sin array envolvente.
pub fn write_records<W: Write>(mut writer: W, records: &[KeyValue]) -> io::Result<()> {
    for kv in records {
        serde_json::to_writer(&mut writer, kv)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Lee registros repetidamente hasta fin de entrada.
/// Una entrada vacía da un vector vacío; un registro truncado es InvalidData.
pub fn read_records<R: Read>(reader: R) -> io::Result<Vec<KeyValue>> {
    let stream = serde_json::Deserializer::from_reader(reader).into_iter::<KeyValue>();

    let mut out = Vec::new();
    for kv in stream {
        let kv = kv.map_err(|e| {
            if e.is_io() {
                io::Error::new(io::ErrorKind::Other, e)
            } else {
                io::Error::new(io::ErrorKind::InvalidData, e)
            }
        })?;
        out.push(kv);
    }
    Ok(out)
}

/// Lee un archivo intermedio completo. El path va en el mensaje de error.
pub fn read_records_file(path: &Path) -> io::Result<Vec<KeyValue>> {
    let file = File::open(path).map_err(|e| {
        io::Error::new(e.kind(), format!("no se pudo abrir {}: {e}", path.display()))
    })?;

    read_records(BufReader::new(file)).map_err(|e| {
        io::Error::new(e.kind(), format!("error al decodificar {}: {e}", path.display()))
    })
}

/// Escribe `path` completo o no lo toca:
///   - escribe en `{path}.tmp-{pid}-{n}` en la misma carpeta
///   - flush y rename sobre `path`
///
/// Un lector concurrente ve la versión anterior o la nueva, nunca un archivo a medias.
/// Varios intentos de la misma tarea pueden escribir a la vez; gana el último rename.
pub fn write_file_atomic<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = tmp_path(path);
    let result = File::create(&tmp)
        .map_err(|e| io::Error::new(e.kind(), format!("no se pudo crear {}: {e}", tmp.display())))
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            write(&mut writer)?;
            writer.flush()
        })
        .and_then(|()| {
            fs::rename(&tmp, path).map_err(|e| {
                io::Error::new(e.kind(), format!("no se pudo reemplazar {}: {e}", path.display()))
            })
        });

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn tmp_path(path: &Path) -> PathBuf {
    let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".tmp-{}-{}", std::process::id(), n));
    path.with_file_name(name)
}

/// Escribe los registros en `path` de forma atómica. Crea la carpeta padre si hace falta.
pub fn write_records_file(path: &Path, records: &[KeyValue]) -> io::Result<()> {
    write_file_atomic(path, |w| write_records(w, records))
}
