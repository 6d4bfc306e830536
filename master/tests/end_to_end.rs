use common::{
    engine,
    naming::merge_name,
    reduce::{do_reduce, KeyOrder, ReduceTask},
    wordcount, DoTaskArgs, JobPhase,
};
use master::{run_job, DriverContext, TaskInvoker, WorkerFeed};
use std::{
    collections::{HashMap, HashSet},
    env, fs,
    future::Future,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::time::timeout;

/// Worker en proceso: ejecuta DoTask directamente con el engine de `common`.
/// Los workers en `broken` fallan siempre sin tocar nada.
struct LocalInvoker {
    work_dir: PathBuf,
    broken: HashSet<String>,
    attempts: Mutex<HashMap<(JobPhase, usize), usize>>,
}

impl LocalInvoker {
    fn new(work_dir: &Path, broken: &[&str]) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            broken: broken.iter().map(|w| w.to_string()).collect(),
            attempts: Mutex::new(HashMap::new()),
        }
    }
}

fn execute(work_dir: &Path, args: &DoTaskArgs) -> std::io::Result<()> {
    match args.phase {
        JobPhase::Map => {
            let file = args.file.as_deref().unwrap_or_default();
            engine::do_map(
                work_dir,
                &args.job_name,
                args.task_number,
                Path::new(file),
                args.num_other_phase,
                wordcount::map_f,
            )
        }
        JobPhase::Reduce => {
            let out = work_dir.join(merge_name(&args.job_name, args.task_number));
            let task = ReduceTask {
                work_dir,
                job_name: &args.job_name,
                reduce_task: args.task_number,
                n_map: args.num_other_phase,
                out_file: &out,
                order: KeyOrder::Descending,
            };
            do_reduce(&task, wordcount::reduce_f).map(|_| ())
        }
    }
}

impl TaskInvoker for LocalInvoker {
    fn invoke(&self, worker: &str, args: &DoTaskArgs) -> impl Future<Output = bool> + Send {
        *self
            .attempts
            .lock()
            .unwrap()
            .entry((args.phase, args.task_number))
            .or_insert(0) += 1;

        let broken = self.broken.contains(worker);
        let work_dir = self.work_dir.clone();
        let args = args.clone();

        async move {
            if broken {
                return false;
            }
            tokio::task::spawn_blocking(move || execute(&work_dir, &args).is_ok())
                .await
                .unwrap_or(false)
        }
    }
}

fn temp_dir(sub: &str) -> PathBuf {
    let base = env::temp_dir().join("master_end_to_end").join(sub);
    let _ = fs::remove_dir_all(&base);
    fs::create_dir_all(&base).unwrap();
    base
}

fn write_inputs(dir: &Path, texts: &[&str]) -> Vec<String> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let path = dir.join(format!("input-{i}.txt"));
            fs::write(&path, text).unwrap();
            path.to_string_lossy().to_string()
        })
        .collect()
}

/// Conteo secuencial de referencia, en el mismo formato que el merge final.
fn sequential_wordcount(texts: &[&str]) -> String {
    let mut counts: std::collections::BTreeMap<String, u64> = Default::default();
    for text in texts {
        for kv in wordcount::map_f("", text) {
            *counts.entry(kv.key).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .map(|(k, v)| format!("{k}: {v}\n"))
        .collect()
}

const TEXTS: [&str; 4] = [
    "el veloz murciélago hindú comía feliz cardillo y kiwi",
    "la cigüeña tocaba el saxofón detrás del palenque de paja",
    "el kiwi y el cardillo",
    "",
];

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn run_job_salida_igual_a_wordcount_secuencial() {
    let dir = temp_dir("ok");
    let files = write_inputs(&dir, &TEXTS);

    let feed = WorkerFeed::new();
    for w in ["w1", "w2", "w3"] {
        feed.register(w.to_string());
    }
    let ctx = DriverContext {
        feed: feed.clone(),
        invoker: Arc::new(LocalInvoker::new(&dir, &[])),
        work_dir: dir.clone(),
    };

    let output = timeout(Duration::from_secs(20), run_job(&ctx, "wc", &files, 3))
        .await
        .expect("el job no terminó")
        .unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), sequential_wordcount(&TEXTS));

    // intermedios borrados, workers de vuelta en el feed
    assert!(!dir.join(merge_name("wc", 0)).exists());
    assert_eq!(feed.available(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn run_job_descarta_workers_rotos_y_termina() {
    let dir = temp_dir("broken");
    let files = write_inputs(&dir, &TEXTS);

    let feed = WorkerFeed::new();
    feed.register("roto-1".to_string());
    feed.register("sano".to_string());
    feed.register("roto-2".to_string());

    let invoker = Arc::new(LocalInvoker::new(&dir, &["roto-1", "roto-2"]));
    let ctx = DriverContext {
        feed: feed.clone(),
        invoker: invoker.clone(),
        work_dir: dir.clone(),
    };

    let output = timeout(Duration::from_secs(20), run_job(&ctx, "wc", &files, 2))
        .await
        .expect("el job no terminó")
        .unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), sequential_wordcount(&TEXTS));

    // cada tarea se intentó al menos una vez; los rotos no volvieron al feed
    let attempts = invoker.attempts.lock().unwrap().clone();
    assert_eq!(
        attempts.keys().filter(|(p, _)| *p == JobPhase::Map).count(),
        TEXTS.len()
    );
    assert_eq!(
        attempts.keys().filter(|(p, _)| *p == JobPhase::Reduce).count(),
        2
    );
    assert_eq!(attempts.values().sum::<usize>(), TEXTS.len() + 2 + 2);
    assert_eq!(feed.available(), 1);
    assert_eq!(feed.acquire().await, "sano");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_job_espera_hasta_que_se_registre_un_worker() {
    let dir = temp_dir("late");
    let files = write_inputs(&dir, &TEXTS[..2]);

    let feed = WorkerFeed::new();
    let ctx = DriverContext {
        feed: feed.clone(),
        invoker: Arc::new(LocalInvoker::new(&dir, &[])),
        work_dir: dir.clone(),
    };

    let running = tokio::spawn(async move { run_job(&ctx, "tarde", &files, 2).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!running.is_finished());

    feed.register("recien-llegado".to_string());

    let output = timeout(Duration::from_secs(20), running)
        .await
        .expect("el job no terminó")
        .unwrap()
        .unwrap();
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        sequential_wordcount(&TEXTS[..2])
    );
}
