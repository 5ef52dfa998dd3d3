use std::io::Read;
use tempfile::TempDir;
use tripsplit::core::{InputSource, OutputFormat};
use tripsplit::domain::model::Category;
use tripsplit::{
    CliConfig, LocalStorage, ReportEngine, ReportPipeline, SettleError, SettlementPolicy,
    SettlementReport, TomlConfig,
};

const TRIP_JSON: &str = r#"{
  "trip": { "name": "Kyoto 2024", "defaultCurrency": "USD" },
  "members": [
    { "id": "a", "displayName": "Aki" },
    { "id": "b", "displayName": "Ben" },
    { "id": "c", "username": "Cleo" }
  ],
  "expenses": [
    {
      "id": "e1", "transactionGroupId": "g1", "description": "Ryokan",
      "category": "Hotel", "expenseDate": "2024-05-01T15:00:00Z",
      "payeeId": "a", "payers": ["a", "b", "c"], "amount": 60, "currency": "USD"
    },
    {
      "id": "e2", "transactionGroupId": "g1", "description": "Ryokan",
      "category": "Hotel", "expenseDate": "2024-05-01T15:00:00Z",
      "payeeId": "b", "payers": ["a", "b", "c"], "amount": 40, "currency": "USD"
    },
    {
      "id": "e3", "description": "Ramen",
      "category": "Food and Beverage", "expenseDate": "2024-05-02",
      "payeeId": "c", "payers": ["a", "c"], "amount": 3140, "currency": "JPY"
    }
  ]
}"#;

async fn write_trip(dir: &TempDir) -> String {
    let path = dir.path().join("trip.json");
    tokio::fs::write(&path, TRIP_JSON).await.unwrap();
    path.to_str().unwrap().to_string()
}

fn read_report(dir: &std::path::Path) -> SettlementReport {
    let data = std::fs::read(dir.join("report.json")).unwrap();
    serde_json::from_slice(&data).unwrap()
}

#[tokio::test]
async fn test_end_to_end_json_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_trip(&temp_dir).await;
    let output_path = temp_dir.path().join("out");

    let config = CliConfig::new(
        InputSource::Json { path: input },
        output_path.to_str().unwrap(),
    );
    let pipeline = ReportPipeline::new(LocalStorage::default(), config);
    let engine = ReportEngine::new(pipeline);

    let result = engine.run().await.unwrap();
    assert_eq!(result, output_path.to_str().unwrap());

    for name in [
        "report.json",
        "balances.csv",
        "by_category.csv",
        "by_payee.csv",
        "by_payer_share.csv",
        "by_day.csv",
        "transactions.csv",
        "recent_transactions.csv",
    ] {
        assert!(output_path.join(name).exists(), "missing {}", name);
    }

    let report = read_report(&output_path);
    assert_eq!(report.display_currency, "USD");
    // 3140 JPY = 20 USD
    assert!((report.grand_total - 120.0).abs() < 1e-9);
    assert_eq!(report.transactions.len(), 2);
    assert_eq!(report.transactions[0].payee_list(), "Aki, Ben");
    assert!((report.transactions[0].total - 100.0).abs() < 1e-9);
    assert_eq!(report.balances[2].display_name, "Cleo");
    let net: f64 = report.balances.iter().map(|b| b.net_balance).sum();
    assert!(net.abs() < 1e-6);
    assert!(report.anomalies.is_empty());

    let by_day = std::fs::read_to_string(output_path.join("by_day.csv")).unwrap();
    assert_eq!(by_day, "label,total\n2024-05-01,100.00\n2024-05-02,20.00\n");

    let recent: Vec<&str> = report
        .recent_transactions
        .iter()
        .map(|line| line.group_id.as_str())
        .collect();
    assert_eq!(recent, vec!["e3", "g1"]);
    let recent_csv =
        std::fs::read_to_string(output_path.join("recent_transactions.csv")).unwrap();
    assert!(recent_csv.lines().nth(1).unwrap().starts_with("e3,2024-05-02,Ramen,"));
}

#[tokio::test]
async fn test_recent_transactions_keep_the_latest_ten() {
    let temp_dir = TempDir::new().unwrap();
    let members = temp_dir.path().join("members.csv");
    let expenses = temp_dir.path().join("expenses.csv");
    tokio::fs::write(&members, "id,displayName\na,A\nb,B\n")
        .await
        .unwrap();
    let mut rows = String::from(
        "id,transactionGroupId,description,category,expenseDate,payeeId,payers,amount,currency\n",
    );
    for day in 1..=12 {
        rows.push_str(&format!("e{day},,Lunch,,2024-05-{day:02},a,a;b,10,USD\n"));
    }
    tokio::fs::write(&expenses, rows).await.unwrap();
    let output_path = temp_dir.path().join("out");

    let mut config = CliConfig::new(
        InputSource::Csv {
            members: members.to_str().unwrap().to_string(),
            expenses: expenses.to_str().unwrap().to_string(),
        },
        output_path.to_str().unwrap(),
    );
    config.formats = vec![OutputFormat::Json];

    let engine = ReportEngine::new(ReportPipeline::new(LocalStorage::default(), config));
    engine.run().await.unwrap();

    let report = read_report(&output_path);
    assert_eq!(report.transactions.len(), 12);
    assert_eq!(report.recent_transactions.len(), 10);
    assert_eq!(report.recent_transactions[0].group_id, "e12");
    assert_eq!(report.recent_transactions[9].group_id, "e3");
}

#[tokio::test]
async fn test_display_currency_and_filters() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_trip(&temp_dir).await;
    let output_path = temp_dir.path().join("eur");

    let mut config = CliConfig::new(
        InputSource::Json { path: input },
        output_path.to_str().unwrap(),
    );
    config.display_currency = Some("EUR".to_string());
    config.filter.category = Some(Category::Hotel);
    config.formats = vec![OutputFormat::Json];

    let engine = ReportEngine::new(ReportPipeline::new(LocalStorage::default(), config));
    engine.run().await.unwrap();

    assert!(!output_path.join("balances.csv").exists());
    let report = read_report(&output_path);
    assert_eq!(report.display_currency, "EUR");
    assert!((report.grand_total - 93.0).abs() < 1e-9);
    assert_eq!(report.by_category.len(), 1);
    assert_eq!(report.by_category[0].label, "Hotel");
}

#[tokio::test]
async fn test_csv_input_with_bundle() {
    let temp_dir = TempDir::new().unwrap();
    let members = temp_dir.path().join("members.csv");
    let expenses = temp_dir.path().join("expenses.csv");
    tokio::fs::write(&members, "id,displayName\na,A\nb,B\n")
        .await
        .unwrap();
    tokio::fs::write(
        &expenses,
        "id,transactionGroupId,description,category,expenseDate,payeeId,payers,amount,currency\n\
         e1,g1,Hotel,Hotel,2024-05-01,a,a;b,60,USD\n\
         e2,g1,Hotel,Hotel,2024-05-01,b,a;b,40,USD\n",
    )
    .await
    .unwrap();
    let output_path = temp_dir.path().join("bundle");

    let mut config = CliConfig::new(
        InputSource::Csv {
            members: members.to_str().unwrap().to_string(),
            expenses: expenses.to_str().unwrap().to_string(),
        },
        output_path.to_str().unwrap(),
    );
    config.bundle = Some("report.zip".to_string());

    let engine = ReportEngine::new(ReportPipeline::new(LocalStorage::default(), config));
    let result = engine.run().await.unwrap();
    assert!(result.ends_with("report.zip"));

    let zip_data = std::fs::read(output_path.join("report.zip")).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    assert_eq!(archive.len(), 8);

    let mut transactions = String::new();
    archive
        .by_name("transactions.csv")
        .unwrap()
        .read_to_string(&mut transactions)
        .unwrap();
    assert_eq!(
        transactions,
        "groupId,date,description,category,payees,total,rows\n\
         g1,2024-05-01,Hotel,Hotel,\"A, B\",100.00,2\n"
    );
}

#[tokio::test]
async fn test_strict_policy_rejects_dangling_member() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("trip.json");
    tokio::fs::write(
        &input,
        r#"{
          "members": [{ "id": "a", "displayName": "A" }],
          "expenses": [
            { "id": "e1", "payeeId": "a", "payers": ["a", "ghost"], "amount": 10, "currency": "USD" }
          ]
        }"#,
    )
    .await
    .unwrap();
    let output_path = temp_dir.path().join("out");

    let mut config = CliConfig::new(
        InputSource::Json {
            path: input.to_str().unwrap().to_string(),
        },
        output_path.to_str().unwrap(),
    );
    config.policy = SettlementPolicy::strict();

    let engine = ReportEngine::new(ReportPipeline::new(LocalStorage::default(), config.clone()));
    let err = engine.run().await.unwrap_err();
    assert!(matches!(err, SettleError::DanglingMember { .. }));
    assert_eq!(err.exit_code(), 2);
    assert!(!output_path.exists());

    // 預設政策下照常產出報表並記錄異常
    config.policy = SettlementPolicy::default();
    let engine = ReportEngine::new(ReportPipeline::new(LocalStorage::default(), config));
    engine.run().await.unwrap();
    let report = read_report(&output_path);
    assert_eq!(report.anomalies.len(), 1);
}

#[tokio::test]
async fn test_invalid_amount_fails_extraction() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("trip.json");
    tokio::fs::write(
        &input,
        r#"{
          "members": [{ "id": "a", "displayName": "A" }],
          "expenses": [
            { "id": "e1", "payeeId": "a", "payers": ["a"], "amount": -5, "currency": "USD" }
          ]
        }"#,
    )
    .await
    .unwrap();

    let config = CliConfig::new(
        InputSource::Json {
            path: input.to_str().unwrap().to_string(),
        },
        temp_dir.path().join("out").to_str().unwrap(),
    );
    let engine = ReportEngine::new(ReportPipeline::new(LocalStorage::default(), config));

    let err = engine.run().await.unwrap_err();
    assert!(matches!(err, SettleError::ValidationError { .. }));
}

#[tokio::test]
async fn test_toml_config_end_to_end() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let input = write_trip(&temp_dir).await;
    let output_path = temp_dir.path().join("toml-out");
    let normalized_input = input.replace('\\', "/");
    let normalized_output = output_path.to_str().unwrap().replace('\\', "/");

    let config_content = format!(
        r#"
[report]
name = "kyoto"

[input]
format = "json"
path = "{}"

[currency]
display = "JPY"

[filters]
payer_id = "c"

[output]
path = "{}"
formats = ["json"]
"#,
        normalized_input, normalized_output
    );
    let config = TomlConfig::from_toml_str(&config_content)?;

    let engine = ReportEngine::new(ReportPipeline::new(LocalStorage::default(), config));
    engine.run().await?;

    let report = read_report(&output_path);
    assert_eq!(report.display_currency, "JPY");
    // 100 USD 旅館 + 3140 JPY 拉麵
    assert!((report.grand_total - (15700.0 + 3140.0)).abs() < 1e-6);
    Ok(())
}

#[derive(Clone, Default)]
struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_each_stage_is_logged_once() {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let temp_dir = TempDir::new().unwrap();
    let input = write_trip(&temp_dir).await;
    let config = CliConfig::new(
        InputSource::Json { path: input },
        temp_dir.path().join("out").to_str().unwrap(),
    );
    let engine = ReportEngine::new(ReportPipeline::new(LocalStorage::default(), config));
    engine.run().await.unwrap();

    let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    assert_eq!(logs.matches("Extracted 3 members and 3 expenses").count(), 1);
}
