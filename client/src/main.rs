use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use common::{JobInfo, JobRequest, JobStatus, WorkerInfo};
use reqwest::Client;
use std::{env, time::Duration};

/// Igual que en el worker:
/// - En Docker: MASTER_URL=http://master:8080
/// - Local: default http://localhost:8080
fn master_base_url() -> String {
    env::var("MASTER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CLI simple para hablar con el master")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Envía un job WordCount nuevo
    Submit {
        #[arg(value_name = "NOMBRE")]
        name: String,

        /// Archivos o patrones glob (los expande el master)
        #[arg(value_name = "ENTRADAS", required = true)]
        inputs: Vec<String>,

        /// Cantidad de tareas reduce
        #[arg(long = "nreduce", default_value_t = 3)]
        n_reduce: usize,

        /// Espera hasta que el job termine
        #[arg(long)]
        wait: bool,
    },
    /// Consulta el estado de un job
    Status {
        #[arg(value_name = "JOB_ID")]
        id: String,
    },
    /// Lista los workers registrados
    Workers,
}

fn print_job(job: &JobInfo) {
    println!("Job:");
    println!("  id: {}", job.id);
    println!("  nombre: {}", job.name);
    println!("  estado: {:?}", job.status);
    println!("  archivos: {}", job.files.len());
    println!("  reduce: {}", job.n_reduce);
    if let Some(path) = &job.output_path {
        println!("  salida: {}", path);
    }
    if let Some(err) = &job.error {
        println!("  error: {}", err);
    }
}

async fn fetch_job(client: &Client, base_url: &str, id: &str) -> Result<Option<JobInfo>> {
    let url = format!("{}/api/v1/jobs/{id}", base_url);
    let resp = client.get(&url).send().await?;

    if resp.status().is_success() {
        Ok(Some(resp.json().await?))
    } else {
        Ok(None)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base_url = master_base_url();

    match cli.command {
        Commands::Submit {
            name,
            inputs,
            n_reduce,
            wait,
        } => {
            let url = format!("{}/api/v1/jobs", base_url);
            let resp = client
                .post(&url)
                .json(&JobRequest {
                    name,
                    inputs,
                    n_reduce,
                })
                .send()
                .await?;

            if !resp.status().is_success() {
                bail!("el master rechazó el job: status {}", resp.status());
            }
            let mut job: JobInfo = resp.json().await?;
            println!("Job creado:");
            print_job(&job);

            if wait {
                while matches!(job.status, JobStatus::Accepted | JobStatus::Running) {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    match fetch_job(&client, &base_url, &job.id).await? {
                        Some(j) => job = j,
                        None => bail!("el job {} desapareció del master", job.id),
                    }
                }
                println!("Job terminado:");
                print_job(&job);
            }
        }
        Commands::Status { id } => match fetch_job(&client, &base_url, &id).await? {
            Some(job) => print_job(&job),
            None => println!("No se encontró el job con id {id}"),
        },
        Commands::Workers => {
            let url = format!("{}/api/v1/workers", base_url);
            let workers: Vec<WorkerInfo> = client.get(&url).send().await?.json().await?;

            if workers.is_empty() {
                println!("No hay workers registrados");
            }
            for w in workers {
                println!(
                    "{}  registrado {}  ({} registros)",
                    w.address,
                    w.registered_at.format("%Y-%m-%d %H:%M:%S"),
                    w.registrations
                );
            }
        }
    }

    Ok(())
}
