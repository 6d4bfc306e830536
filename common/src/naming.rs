//! Nombres de archivos compartidos entre master y workers.
//! Todos son relativos al directorio de trabajo común (MR_WORK_DIR).

/// Salida del map `map_task` destinada al reduce `reduce_task`.
pub fn reduce_name(job_name: &str, map_task: usize, reduce_task: usize) -> String {
    format!("mrtmp.{}-{}-{}", job_name, map_task, reduce_task)
}

/// Salida del reduce `reduce_task`.
pub fn merge_name(job_name: &str, reduce_task: usize) -> String {
    format!("mrtmp.{}-res-{}", job_name, reduce_task)
}

/// Resultado final del job, ya fusionado.
pub fn final_name(job_name: &str) -> String {
    format!("mrtmp.{}", job_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nombres_deterministas_y_distintos() {
        assert_eq!(reduce_name("wc", 0, 3), "mrtmp.wc-0-3");
        assert_eq!(reduce_name("wc", 0, 3), reduce_name("wc", 0, 3));
        assert_ne!(reduce_name("wc", 1, 2), reduce_name("wc", 2, 1));
        assert_eq!(merge_name("wc", 3), "mrtmp.wc-res-3");
        assert_eq!(final_name("wc"), "mrtmp.wc");
    }
}
