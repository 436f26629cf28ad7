use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Amount given to a fund when it is added to the portfolio.
pub const DEFAULT_HOLDING_AMOUNT: f64 = 100.0;

/// Currency given to every new holding, whatever the fund trades in.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Category of a fund, as labelled by the fund search collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FundType {
    Index,
    Etf,
    MutualFund,
    Stock,
    /// Any label the collaborator sends that we don't model explicitly.
    Other(String),
}

impl FundType {
    /// Wire label, e.g. `"ETF"` or `"Mutual Fund"`.
    pub fn label(&self) -> &str {
        match self {
            FundType::Index => "Index",
            FundType::Etf => "ETF",
            FundType::MutualFund => "Mutual Fund",
            FundType::Stock => "Stock",
            FundType::Other(label) => label,
        }
    }

    /// Case-insensitive parse; unknown labels are kept as `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "index" => FundType::Index,
            "etf" => FundType::Etf,
            "mutual fund" | "mutualfund" => FundType::MutualFund,
            "stock" | "equity" => FundType::Stock,
            _ => FundType::Other(label.to_string()),
        }
    }
}

impl std::fmt::Display for FundType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for FundType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for FundType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(FundType::from_label(&label))
    }
}

/// A searchable instrument that can be added to the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FundWire")]
pub struct Fund {
    pub name: String,

    /// Ticker symbol as returned by the collaborator (e.g. "SPY", "QQQ")
    pub ticker: String,

    #[serde(rename = "type")]
    pub fund_type: FundType,

    pub description: String,
}

/// The fund search service sends `type`, `fund_type`, or both.
#[derive(Deserialize)]
struct FundWire {
    name: String,
    ticker: String,
    #[serde(rename = "type", default)]
    kind: Option<FundType>,
    #[serde(default)]
    fund_type: Option<FundType>,
    #[serde(default)]
    description: Option<String>,
}

impl From<FundWire> for Fund {
    fn from(wire: FundWire) -> Self {
        Self {
            name: wire.name,
            ticker: wire.ticker,
            fund_type: wire
                .kind
                .or(wire.fund_type)
                .unwrap_or_else(|| FundType::Other("Unknown".to_string())),
            description: wire.description.unwrap_or_default(),
        }
    }
}

impl Fund {
    pub fn new(
        name: impl Into<String>,
        ticker: impl Into<String>,
        fund_type: FundType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ticker: ticker.into(),
            fund_type,
            description: description.into(),
        }
    }
}

/// A single position in the portfolio.
///
/// Holdings have no id: a holding is addressed by its index in the
/// portfolio. Two holdings may share a ticker, in which case both
/// contribute to the combined series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub name: String,
    pub ticker: String,

    #[serde(rename = "type")]
    pub fund_type: FundType,

    /// Money invested, always finite and non-negative
    pub amount: f64,

    pub currency: String,
}

impl Holding {
    /// Build a holding from a selected fund with the default amount and currency.
    pub fn from_fund(fund: &Fund) -> Self {
        Self {
            name: fund.name.clone(),
            ticker: fund.ticker.clone(),
            fund_type: fund.fund_type.clone(),
            amount: DEFAULT_HOLDING_AMOUNT,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    /// The S&P 500 ETF position the portfolio starts from.
    pub fn sp500(amount: f64) -> Self {
        Self {
            name: "S&P 500 ETF".to_string(),
            ticker: "SPY".to_string(),
            fund_type: FundType::Etf,
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    /// True when the ticker carries something other than whitespace.
    pub fn has_ticker(&self) -> bool {
        !self.ticker.trim().is_empty()
    }
}

/// Funds shown in the fund picker before the user types anything.
pub fn default_funds() -> Vec<Fund> {
    vec![
        Fund::new("S&P 500 Index", "SPX", FundType::Index, "Large-cap U.S. equities"),
        Fund::new("Invesco QQQ Trust", "QQQ", FundType::Etf, "Tech-heavy Nasdaq 100 index"),
        Fund::new(
            "Dow Jones Industrial Average",
            "DJI",
            FundType::Index,
            "30 prominent companies listed on U.S. exchanges",
        ),
        Fund::new("Vanguard S&P 500 ETF", "VOO", FundType::Etf, "Low-cost S&P 500 index ETF"),
        Fund::new(
            "Vanguard Total Stock Market ETF",
            "VTI",
            FundType::Etf,
            "Total U.S. stock market exposure",
        ),
    ]
}

/// `GET /funds` response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundSearchResponse {
    #[serde(default)]
    pub funds: Vec<Fund>,
}
