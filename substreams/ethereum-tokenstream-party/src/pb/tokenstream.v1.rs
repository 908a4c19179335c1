// @generated
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Organization {
    #[prost(bytes="vec", tag="1")]
    pub address: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes="vec", tag="2")]
    pub owner: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag="3")]
    pub name: ::prost::alloc::string::String,
    #[prost(uint64, tag="4")]
    pub created_at: u64,
    /// Ordinal of the OrganizationDeployed log.
    #[prost(uint64, tag="5")]
    pub ordinal: u64,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Organizations {
    #[prost(message, repeated, tag="1")]
    pub organizations: ::prost::alloc::vec::Vec<Organization>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Stream {
    #[prost(string, tag="1")]
    pub id: ::prost::alloc::string::String,
    /// Id of the organization entity.
    #[prost(string, tag="2")]
    pub organization: ::prost::alloc::string::String,
    #[prost(bytes="vec", optional, tag="3")]
    pub user: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    #[prost(bytes="vec", optional, tag="4")]
    pub creator: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    #[prost(bytes="vec", optional, tag="5")]
    pub contract: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    #[prost(string, optional, tag="6")]
    pub name: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(uint64, tag="7")]
    pub created_at: u64,
    /// Ordinal of the StreamAdded log.
    #[prost(uint64, tag="8")]
    pub ordinal: u64,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Streams {
    #[prost(message, repeated, tag="1")]
    pub streams: ::prost::alloc::vec::Vec<Stream>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct User {
    #[prost(bytes="vec", tag="1")]
    pub address: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, tag="2")]
    pub created_at: u64,
    #[prost(uint64, tag="3")]
    pub ordinal: u64,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Activity {
    #[prost(string, tag="1")]
    pub id: ::prost::alloc::string::String,
    #[prost(enumeration="ActivityKind", tag="2")]
    pub kind: i32,
    /// Signed big-endian amount.
    #[prost(bytes="vec", tag="3")]
    pub amount: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag="4")]
    pub organization: ::prost::alloc::string::String,
    #[prost(string, tag="5")]
    pub stream: ::prost::alloc::string::String,
    #[prost(string, optional, tag="6")]
    pub user: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(bytes="vec", tag="7")]
    pub actor: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag="8")]
    pub info: ::prost::alloc::string::String,
    #[prost(bytes="vec", tag="9")]
    pub tx_hash: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint32, tag="10")]
    pub log_index: u32,
    #[prost(uint64, tag="11")]
    pub block_number: u64,
    #[prost(uint64, tag="12")]
    pub created_at: u64,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Activities {
    #[prost(message, repeated, tag="1")]
    pub activities: ::prost::alloc::vec::Vec<Activity>,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ActivityKind {
    Withdraw = 0,
    Deposit = 1,
}
impl ActivityKind {
    /// String value of the enum field names used in the ProtoBuf definition.
    ///
    /// The values are not transformed in any way and thus are considered stable
    /// (if the ProtoBuf definition does not change) and safe for programmatic use.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            ActivityKind::Withdraw => "WITHDRAW",
            ActivityKind::Deposit => "DEPOSIT",
        }
    }
    /// Creates an enum from field names used in the ProtoBuf definition.
    pub fn from_str_name(value: &str) -> ::core::option::Option<Self> {
        match value {
            "WITHDRAW" => Some(Self::Withdraw),
            "DEPOSIT" => Some(Self::Deposit),
            _ => None,
        }
    }
}
// @@protoc_insertion_point(module)
