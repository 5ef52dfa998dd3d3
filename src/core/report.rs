use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting settlement report...");

        // Extract
        let snapshot = self.pipeline.extract().await?;

        // Transform
        let result = self.pipeline.transform(snapshot).await?;
        tracing::info!(
            "Settled {} transactions, total {:.2} {}",
            result.report.transactions.len(),
            result.report.grand_total,
            result.report.display_currency
        );
        if !result.report.anomalies.is_empty() {
            tracing::warn!(
                "⚠️ Report contains {} anomalies",
                result.report.anomalies.len()
            );
        }

        // Load
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}
