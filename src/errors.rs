use std::fmt;

#[derive(Debug, Clone)]
pub enum IpRegionError {
    InvalidAddress(String),
    DatasetOpen(String),
    LookupFailure(String),
    ServiceUnavailable(String),
    Fetch(String),
    Timeout(String),
    FileOperation(String),
}

impl IpRegionError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            IpRegionError::InvalidAddress(_) => "E001",
            IpRegionError::DatasetOpen(_) => "E002",
            IpRegionError::LookupFailure(_) => "E003",
            IpRegionError::ServiceUnavailable(_) => "E004",
            IpRegionError::Fetch(_) => "E005",
            IpRegionError::Timeout(_) => "E006",
            IpRegionError::FileOperation(_) => "E007",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            IpRegionError::InvalidAddress(_) => "Invalid Address",
            IpRegionError::DatasetOpen(_) => "Dataset Open Error",
            IpRegionError::LookupFailure(_) => "Lookup Failure",
            IpRegionError::ServiceUnavailable(_) => "Service Unavailable",
            IpRegionError::Fetch(_) => "Fetch Error",
            IpRegionError::Timeout(_) => "Timeout Error",
            IpRegionError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            IpRegionError::InvalidAddress(msg) => msg,
            IpRegionError::DatasetOpen(msg) => msg,
            IpRegionError::LookupFailure(msg) => msg,
            IpRegionError::ServiceUnavailable(msg) => msg,
            IpRegionError::Fetch(msg) => msg,
            IpRegionError::Timeout(msg) => msg,
            IpRegionError::FileOperation(msg) => msg,
        }
    }
}

impl fmt::Display for IpRegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message())
    }
}

impl std::error::Error for IpRegionError {}

// 便捷的构造函数
impl IpRegionError {
    pub fn invalid_address<T: Into<String>>(msg: T) -> Self {
        IpRegionError::InvalidAddress(msg.into())
    }

    pub fn dataset_open<T: Into<String>>(msg: T) -> Self {
        IpRegionError::DatasetOpen(msg.into())
    }

    pub fn lookup_failure<T: Into<String>>(msg: T) -> Self {
        IpRegionError::LookupFailure(msg.into())
    }

    pub fn service_unavailable<T: Into<String>>(msg: T) -> Self {
        IpRegionError::ServiceUnavailable(msg.into())
    }

    pub fn fetch<T: Into<String>>(msg: T) -> Self {
        IpRegionError::Fetch(msg.into())
    }

    pub fn timeout<T: Into<String>>(msg: T) -> Self {
        IpRegionError::Timeout(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        IpRegionError::FileOperation(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<std::io::Error> for IpRegionError {
    fn from(err: std::io::Error) -> Self {
        IpRegionError::FileOperation(err.to_string())
    }
}

impl From<ureq::Error> for IpRegionError {
    fn from(err: ureq::Error) -> Self {
        IpRegionError::Fetch(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IpRegionError>;
