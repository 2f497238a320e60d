use tracing::Span;
use tracing_subscriber::EnvFilter;

/// Initialize tracing with `RUST_LOG` support, INFO by default
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();
}

/// Log handle owned by one sensor.
///
/// Every event recorded while the span is entered carries the sensor's name
/// and id, so driver code can use the plain `tracing` macros.
#[derive(Debug, Clone)]
pub struct SensorLogger {
    name: &'static str,
    id: u8,
    span: Span,
}

impl SensorLogger {
    pub fn new(name: &'static str, id: u8) -> Self {
        let span = tracing::info_span!("sensor", sensor = name, id);
        Self { name, id, span }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// `NAME:id`, used in error values and reports
    pub fn tag(&self) -> String {
        format!("{}:{}", self.name, self.id)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
