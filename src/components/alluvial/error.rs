use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlluvialError {
	#[error("no browser window available")]
	NoWindow,
	#[error("request for {url} failed: {message}")]
	Request { url: String, message: String },
	#[error("{url} answered HTTP {status}")]
	Http { url: String, status: u16 },
	#[error("malformed JSON: {0}")]
	Json(#[from] serde_json::Error),
	#[error("malformed CSV: {0}")]
	Csv(#[from] csv::Error),
	#[error("tooltip table has no `{0}` column")]
	MissingColumn(&'static str),
	#[error("scale domain [{0}, {1}] is not finite")]
	NonFiniteDomain(f64, f64),
}
