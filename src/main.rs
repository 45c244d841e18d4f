use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rondo::config::SchedulerConfig;
use rondo::scheduler::{Job, Scheduler};
use rondo::shutdown::install_shutdown_handler;
use rondo::task::BoxedTask;
use rondo::tasks::{DirChurn, ForecastTask, ReadLines, WeatherClient, WriteLines};

#[derive(Parser, Debug)]
#[command(name = "rondo")]
#[command(version)]
#[command(about = "A minimal cooperative round-robin job dispatcher")]
struct Args {
    /// Maximum number of jobs in the queue
    #[arg(long, default_value = "10")]
    pool_size: usize,

    /// Pause between dispatch cycles, in milliseconds
    #[arg(long, default_value = "100")]
    poll_interval_ms: u64,

    /// Directory the filesystem demo jobs work in
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Number of lines the write/read demo jobs handle
    #[arg(long, default_value = "100")]
    lines: usize,

    /// Base URL of a weather endpoint; enables the forecast job
    #[arg(long)]
    weather_url: Option<String>,

    /// Cities the forecast job polls (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "MOSCOW,PARIS,LONDON")]
    cities: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = SchedulerConfig::new(args.pool_size)
        .with_poll_interval(Duration::from_millis(args.poll_interval_ms));
    let scheduler = Scheduler::new(config);

    let workdir = args.workdir.clone();
    let churn = Job::builder().build(move || -> rondo::Result<BoxedTask> {
        Ok(Box::new(DirChurn::new(workdir, 2)))
    })?;
    scheduler.schedule(churn).await;

    // read-lines only runs once write-lines has left the queue
    let lines_path = args.workdir.join("lines.txt");
    let (write_path, count) = (lines_path.clone(), args.lines);
    let write = Job::builder().build(move || -> rondo::Result<BoxedTask> {
        Ok(Box::new(WriteLines::new(write_path, count)))
    })?;
    let read = Job::builder()
        .dependency(write)
        .build(move || -> rondo::Result<BoxedTask> { Ok(Box::new(ReadLines::new(lines_path))) })?;
    scheduler.schedule(read).await;

    if let Some(url) = args.weather_url {
        let client = WeatherClient::new(url);
        let cities = args.cities.clone();
        let forecast = Job::builder().build(move || -> rondo::Result<BoxedTask> {
            Ok(Box::new(ForecastTask::new(client, cities)))
        })?;
        scheduler.schedule(forecast).await;
    }

    let shutdown = install_shutdown_handler();
    scheduler.run(shutdown).await?;
    Ok(())
}
