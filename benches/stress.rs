//! Latency stress harness against a RUNNING inspectd server.
//!
//! Start the server, then:
//!   INSPECTD_HOST=127.0.0.1 INSPECTD_PORT=5434 cargo bench --bench stress

use std::time::{Duration, Instant};

use chrono::{Days, Utc};
use tokio_postgres::{Config, NoTls};
use ulid::Ulid;

async fn connect(host: &str, port: u16) -> tokio_postgres::Client {
    let mut config = Config::new();
    config
        .host(host)
        .port(port)
        .dbname(format!("bench_{}", Ulid::new()))
        .user("staff")
        .password("inspectd");

    let (client, conn) = config.connect(NoTls).await.expect("connect failed");
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            eprintln!("connection error: {e}");
        }
    });
    client
}

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.2}ms, p50={:.2}ms, p95={:.2}ms, p99={:.2}ms, max={:.2}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies.last().unwrap().as_secs_f64() * 1000.0,
    );
}

async fn setup(client: &tokio_postgres::Client, count: usize) -> Vec<Ulid> {
    let mut inspectors = Vec::with_capacity(count);

    for _ in 0..count {
        let id = Ulid::new();
        client
            .batch_execute(&format!("INSERT INTO inspectors (id) VALUES ('{id}')"))
            .await
            .unwrap();

        // Bookable every day, 08:00–18:00.
        let rows: Vec<String> = (0..7)
            .map(|wd| format!("('{}', '{id}', {wd}, 480, 1080, true)", Ulid::new()))
            .collect();
        client
            .batch_execute(&format!(
                r#"INSERT INTO availability (id, inspector_id, weekday, start, "end", active) VALUES {}"#,
                rows.join(", ")
            ))
            .await
            .unwrap();

        client
            .batch_execute(&format!(
                "UPDATE settings SET buffer_minutes = 15, max_daily_bookings = 20, \
                 advance_days = 60 WHERE inspector_id = '{id}'"
            ))
            .await
            .unwrap();

        inspectors.push(id);
    }

    println!("  created {count} inspectors");
    inspectors
}

#[tokio::main]
async fn main() {
    let host = std::env::var("INSPECTD_HOST").unwrap_or_else(|_| "127.0.0.1".into());
    let port: u16 = std::env::var("INSPECTD_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5434);

    println!("inspectd stress bench → {host}:{port}");
    let client = connect(&host, port).await;

    println!("setup:");
    let inspectors = setup(&client, 10).await;

    let today = Utc::now().date_naive();
    let from = today.checked_add_days(Days::new(1)).unwrap();
    let to = today.checked_add_days(Days::new(28)).unwrap();

    // Slot queries: 4-week range, 90-minute slots, round-robin inspectors.
    println!("slot queries:");
    let mut latencies = Vec::with_capacity(500);
    for i in 0..500 {
        let id = inspectors[i % inspectors.len()];
        let sql = format!(
            "SELECT * FROM slots WHERE inspector_id = '{id}' AND date >= '{from}' \
             AND date <= '{to}' AND duration = 90"
        );
        let start = Instant::now();
        client.simple_query(&sql).await.unwrap();
        latencies.push(start.elapsed());
    }
    print_latency("slots/4wk/90min", &mut latencies);

    // Booking commits: non-overlapping slots so every insert succeeds.
    println!("booking commits:");
    let mut latencies = Vec::new();
    let mut day = from;
    'outer: for _ in 0..14 {
        for hour in 0..5i64 {
            for (n, &id) in inspectors.iter().enumerate() {
                let sql = format!(
                    "INSERT INTO bookings (id, inspector_id, date, start, duration, \
                     client_name, client_email, client_phone, address) \
                     VALUES ('{}', '{id}', '{day}', {}, 60, 'Bench Client {n}', \
                     'bench@example.com', NULL, '1 Bench Way')",
                    Ulid::new(),
                    480 + hour * 120,
                );
                let start = Instant::now();
                client.simple_query(&sql).await.unwrap();
                latencies.push(start.elapsed());
                if latencies.len() >= 500 {
                    break 'outer;
                }
            }
        }
        day = day.succ_opt().unwrap();
    }
    print_latency("insert_booking", &mut latencies);

    // Conflicting commits: every attempt lands on an occupied interval.
    println!("conflict rejections:");
    let mut latencies = Vec::with_capacity(200);
    for i in 0..200 {
        let id = inspectors[i % inspectors.len()];
        let sql = format!(
            "INSERT INTO bookings (id, inspector_id, date, start, duration, \
             client_name, client_email, client_phone, address) \
             VALUES ('{}', '{id}', '{from}', 500, 60, 'Bench Client', \
             'bench@example.com', NULL, '1 Bench Way')",
            Ulid::new(),
        );
        let start = Instant::now();
        let result = client.simple_query(&sql).await;
        latencies.push(start.elapsed());
        assert!(result.is_err(), "conflicting insert must be rejected");
    }
    print_latency("conflict_reject", &mut latencies);

    println!("done");
}
