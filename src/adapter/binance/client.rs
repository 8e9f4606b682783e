//! Binance USDT-M futures REST client.
//!
//! Signed endpoints follow the exchange's scheme: the query string carries
//! `recvWindow` and `timestamp`, is signed with HMAC-SHA256 using the API
//! secret, and the hex signature is appended as `signature`. The API key goes
//! in the `X-MBX-APIKEY` header. Every call is a single attempt.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tracing::{debug, info};
use url::form_urlencoded;

use super::dto::{
    ApiErrorDto, ExchangeInfoDto, LeverageDto, ListenKeyDto, OrderDto, PositionRiskDto,
    PremiumIndexDto, UserTradeDto,
};
use crate::domain::{
    AccountTrade, MarginType, OpenOrder, OrderAck, OrderId, OrderRequest, PositionRisk,
    SymbolPrecision,
};
use crate::error::ExchangeError;
use crate::exchange::{FuturesExchange, LeverageChange, TradeQuery};

type HmacSha256 = Hmac<Sha256>;

/// "No need to change margin type."
const NO_MARGIN_TYPE_CHANGE: i64 = -4046;
/// "No need to change position side."
const NO_POSITION_MODE_CHANGE: i64 = -4059;

type Params = Vec<(&'static str, String)>;

/// API key pair. `Debug` never prints the secret.
#[derive(Clone)]
pub struct BinanceCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for BinanceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceCredentials")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// REST client for the Binance USDT-M futures API.
pub struct BinanceFutures {
    client: Client,
    base_url: String,
    credentials: BinanceCredentials,
    recv_window_ms: u64,
}

impl BinanceFutures {
    /// Create a client against `base_url` (e.g. `https://fapi.binance.com`).
    pub fn new(
        base_url: impl Into<String>,
        credentials: BinanceCredentials,
        recv_window_ms: u64,
        timeout: Duration,
    ) -> Result<Self, ExchangeError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            recv_window_ms,
        })
    }

    fn sign(&self, query: &str) -> Result<String, ExchangeError> {
        let mut mac = HmacSha256::new_from_slice(self.credentials.api_secret.as_bytes())
            .map_err(|e| ExchangeError::Other(format!("invalid API secret: {e}")))?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn signed_query(&self, params: &[(&str, String)]) -> Result<String, ExchangeError> {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in params {
            serializer.append_pair(key, value);
        }
        serializer.append_pair("recvWindow", &self.recv_window_ms.to_string());
        serializer.append_pair("timestamp", &Utc::now().timestamp_millis().to_string());
        let query = serializer.finish();
        let signature = self.sign(&query)?;
        Ok(format!("{query}&signature={signature}"))
    }

    async fn signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: Params,
    ) -> Result<T, ExchangeError> {
        let query = self.signed_query(&params)?;
        let url = format!("{}{path}?{query}", self.base_url);
        debug!(method = %method, path, "Signed request");

        let response = self
            .client
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.credentials.api_key)
            .send()
            .await?;
        parse_response(response).await
    }

    async fn public<T: DeserializeOwned>(&self, path: &str, params: Params) -> Result<T, ExchangeError> {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.get(&url).query(&params).send().await?;
        parse_response(response).await
    }

    /// Listen-key endpoints take the API key but no signature.
    async fn keyed<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T, ExchangeError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.credentials.api_key)
            .send()
            .await?;
        parse_response(response).await
    }
}

/// `fromId` cannot be combined with the time bounds on this endpoint.
fn user_trades_params(query: &TradeQuery) -> Result<Params, ExchangeError> {
    let Some(symbol) = &query.symbol else {
        return Err(ExchangeError::Other(
            "Binance trade history requires a symbol".to_string(),
        ));
    };
    let mut params = vec![
        ("symbol", symbol.clone()),
        ("limit", query.limit.to_string()),
    ];
    match query.from_id {
        Some(from_id) => params.push(("fromId", from_id.to_string())),
        None => {
            params.push(("startTime", query.start.timestamp_millis().to_string()));
            params.push(("endTime", query.end.timestamp_millis().to_string()));
        }
    }
    Ok(params)
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ExchangeError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(match serde_json::from_str::<ApiErrorDto>(&body) {
            Ok(e) => ExchangeError::Api {
                code: e.code,
                msg: e.msg,
            },
            Err(_) => ExchangeError::Status {
                status: status.as_u16(),
                body,
            },
        });
    }

    Ok(serde_json::from_str(&body)?)
}

fn decimal_param(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Query parameters for a new order.
pub(crate) fn order_params(order: &OrderRequest) -> Params {
    let mut params: Params = vec![
        ("symbol", order.symbol.clone()),
        ("side", order.side.as_str().to_string()),
        ("positionSide", order.position_side.as_str().to_string()),
        ("type", order.order_type.as_str().to_string()),
    ];
    if let Some(quantity) = order.quantity {
        params.push(("quantity", decimal_param(quantity)));
    }
    if let Some(stop_price) = order.stop_price {
        params.push(("stopPrice", decimal_param(stop_price)));
    }
    if order.close_position {
        params.push(("closePosition", "true".to_string()));
    }
    if let Some(working_type) = order.working_type {
        params.push(("workingType", working_type.as_str().to_string()));
    }
    if order.price_protect {
        params.push(("priceProtect", "TRUE".to_string()));
    }
    if order.good_till_cancel {
        params.push(("timeInForce", "GTC".to_string()));
    }
    params
}

#[async_trait]
impl FuturesExchange for BinanceFutures {
    async fn position_risk(&self, symbol: &str) -> Result<Vec<PositionRisk>, ExchangeError> {
        let risks: Vec<PositionRiskDto> = self
            .signed(Method::GET, "/fapi/v2/positionRisk", vec![("symbol", symbol.to_string())])
            .await?;
        Ok(risks.into_iter().map(PositionRisk::from).collect())
    }

    async fn change_leverage(
        &self,
        symbol: &str,
        leverage: u32,
    ) -> Result<LeverageChange, ExchangeError> {
        let dto: LeverageDto = self
            .signed(
                Method::POST,
                "/fapi/v1/leverage",
                vec![("symbol", symbol.to_string()), ("leverage", leverage.to_string())],
            )
            .await?;
        let change = LeverageChange::from(dto);
        info!(
            symbol = %change.symbol,
            leverage = change.leverage,
            max_notional = %change.max_notional_value,
            "Leverage set"
        );
        Ok(change)
    }

    async fn change_margin_type(
        &self,
        symbol: &str,
        margin_type: MarginType,
    ) -> Result<(), ExchangeError> {
        let result: Result<serde_json::Value, _> = self
            .signed(
                Method::POST,
                "/fapi/v1/marginType",
                vec![
                    ("symbol", symbol.to_string()),
                    ("marginType", margin_type.as_str().to_string()),
                ],
            )
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(ExchangeError::Api { code, .. }) if code == NO_MARGIN_TYPE_CHANGE => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn change_position_mode(&self, dual_side: bool) -> Result<(), ExchangeError> {
        let result: Result<serde_json::Value, _> = self
            .signed(
                Method::POST,
                "/fapi/v1/positionSide/dual",
                vec![("dualSidePosition", dual_side.to_string())],
            )
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(ExchangeError::Api { code, .. }) if code == NO_POSITION_MODE_CHANGE => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn open_orders(&self, symbol: &str) -> Result<Vec<OpenOrder>, ExchangeError> {
        let orders: Vec<OrderDto> = self
            .signed(Method::GET, "/fapi/v1/openOrders", vec![("symbol", symbol.to_string())])
            .await?;
        Ok(orders.into_iter().map(OpenOrder::from).collect())
    }

    async fn cancel_order(&self, symbol: &str, order_id: OrderId) -> Result<(), ExchangeError> {
        let _: serde_json::Value = self
            .signed(
                Method::DELETE,
                "/fapi/v1/order",
                vec![("symbol", symbol.to_string()), ("orderId", order_id.to_string())],
            )
            .await?;
        Ok(())
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        let dto: OrderDto = self
            .signed(Method::POST, "/fapi/v1/order", order_params(order))
            .await?;
        let ack = OrderAck::from(dto);
        info!(
            symbol = %ack.symbol,
            order_id = %ack.order_id,
            order_type = %order.order_type,
            status = %ack.status,
            "Order accepted"
        );
        Ok(ack)
    }

    async fn symbol_precision(&self, symbol: &str) -> Result<SymbolPrecision, ExchangeError> {
        let info: ExchangeInfoDto = self.public("/fapi/v1/exchangeInfo", vec![]).await?;
        info.precision(symbol)
            .ok_or_else(|| ExchangeError::UnknownSymbol(symbol.to_string()))
    }

    async fn mark_price(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        let index: PremiumIndexDto = self
            .public("/fapi/v1/premiumIndex", vec![("symbol", symbol.to_string())])
            .await?;
        Ok(index.mark_price)
    }

    async fn account_trades(&self, query: &TradeQuery) -> Result<Vec<AccountTrade>, ExchangeError> {
        let trades: Vec<UserTradeDto> = self
            .signed(Method::GET, "/fapi/v1/userTrades", user_trades_params(query)?)
            .await?;
        Ok(trades.into_iter().map(AccountTrade::from).collect())
    }

    async fn start_user_stream(&self) -> Result<String, ExchangeError> {
        let dto: ListenKeyDto = self.keyed(Method::POST, "/fapi/v1/listenKey").await?;
        Ok(dto.listen_key)
    }

    async fn keepalive_user_stream(&self) -> Result<(), ExchangeError> {
        let _: serde_json::Value = self.keyed(Method::PUT, "/fapi/v1/listenKey").await?;
        Ok(())
    }

    fn exchange_name(&self) -> &'static str {
        "binance-futures"
    }
}
