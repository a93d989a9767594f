//! OFX 1.02 (SGML) rendering of a portfolio export
//!
//! Portfolio software reads this dialect leniently: end tags may be left
//! out, and indentation is irrelevant. Each block is written from a fixed
//! template and the document is flattened at the end by dropping blank
//! lines and left-trimming the rest.

use chrono::NaiveDateTime;

use super::portfolio::{InvestmentBuy, Security};

const HEADER: &str = "OFXHEADER:100
DATA:OFXSGML
VERSION:102
SECURITY:NONE
ENCODING:USASCII
CHARSET:1252
COMPRESSION:NONE
OLDFILEUID:NONE
NEWFILEUID:NONE

";

/// Document-level parameters.
#[derive(Debug, Clone)]
pub struct DocumentInfo<'a> {
    pub as_of: NaiveDateTime,
    pub broker: &'a str,
    pub account: &'a str,
}

/// OFX timestamp, to milliseconds: `YYYYMMDDHHMMSS.mmm`
pub fn render_ofx_date(dtime: NaiveDateTime) -> String {
    dtime.format("%Y%m%d%H%M%S%.3f").to_string()
}

fn render_transaction(buy: &InvestmentBuy) -> String {
    let txntype = if buy.mutual_fund { "BUYMF" } else { "BUYSTOCK" };
    format!(
        "
        <{txntype}>
          <INVBUY>
            <INVTRAN>
              <FITID>{fitid}
              <DTTRADE>{dttrade}
              <MEMO>{memo}
            </INVTRAN>
            <SECID>
              <UNIQUEID>{uniqueid}
              <UNIQUEIDTYPE>TICKER
            </SECID>
            <UNITS>{units}
            <UNITPRICE>{unitprice}
            <COMMISSION>{fee}
            <TOTAL>{total}
            <SUBACCTSEC>CASH
            <SUBACCTFUND>CASH
          </INVBUY>
          <BUYTYPE>BUY
        </{txntype}>
",
        txntype = txntype,
        fitid = buy.fitid,
        dttrade = render_ofx_date(buy.trade_date),
        memo = buy.memo,
        uniqueid = buy.ticker,
        units = buy.units,
        unitprice = buy.unit_price,
        fee = buy.fee,
        total = buy.total(),
    )
}

fn render_security(security: &Security) -> String {
    let infotype = if security.mutual_fund { "MFINFO" } else { "STOCKINFO" };
    format!(
        "
        <{infotype}>
          <SECINFO>
            <SECID>
              <UNIQUEID>{uniqueid}
              <UNIQUEIDTYPE>TICKER
            </SECID>
            <SECNAME>{secname}
            <TICKER>{ticker}
          </SECINFO>
        </{infotype}>
",
        infotype = infotype,
        uniqueid = security.currency,
        secname = security.currency,
        ticker = security.ticker,
    )
}

fn render_body(info: &DocumentInfo, invtranlist: &str, seclist: &str) -> String {
    let date = render_ofx_date(info.as_of);
    format!(
        "
<OFX>
  <SIGNONMSGSRSV1>
    <SONRS>
      <STATUS>
        <CODE>0
        <SEVERITY>INFO
      </STATUS>
      <DTSERVER>{dtserver}
      <LANGUAGE>ENG
    </SONRS>
  </SIGNONMSGSRSV1>
  <INVSTMTMSGSRSV1>
    <INVSTMTTRNRS>
      <TRNUID>1001
      <STATUS>
        <CODE>0
        <SEVERITY>INFO
      </STATUS>
      <INVSTMTRS>
        <DTASOF>{dtasof}
        <CURDEF>USD
        <INVACCTFROM>
          <BROKERID>{broker}
          <ACCTID>{account}
        </INVACCTFROM>
        <INVTRANLIST>
          <DTSTART>{dtstart}
          <DTEND>{dtend}
          {invtranlist}
        </INVTRANLIST>
      </INVSTMTRS>
    </INVSTMTTRNRS>
  </INVSTMTMSGSRSV1>
  <SECLISTMSGSRSV1>
    <SECLIST>
     {seclist}
    </SECLIST>
  </SECLISTMSGSRSV1>
</OFX>
",
        dtserver = date,
        dtasof = date,
        dtstart = date,
        dtend = date,
        broker = info.broker,
        account = info.account,
        invtranlist = invtranlist,
        seclist = seclist,
    )
}

/// Render the full document. Transactions keep their order; securities
/// are listed sorted.
pub fn render_document(
    transactions: &[InvestmentBuy],
    securities: &[Security],
    info: &DocumentInfo,
) -> String {
    let invtranlist: String = transactions.iter().map(render_transaction).collect();

    let mut sorted: Vec<&Security> = securities.iter().collect();
    sorted.sort();
    let seclist: String = sorted.into_iter().map(render_security).collect();

    let body = render_body(info, &invtranlist, &seclist);
    let stripped = body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::trim_start)
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}{}", HEADER, stripped)
}
