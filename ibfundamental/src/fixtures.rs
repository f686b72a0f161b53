// ibfundamental/src/fixtures.rs
// Sample provider documents shared by the unit tests

use crate::bundle::DocumentBundle;
use crate::data::FundamentalReportType;

pub const OWNERSHIP_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<OwnershipSnapshot>
  <ISIN>US0378331005</ISIN>
  <floatShares asofDate="2024-04-19">15204137000</floatShares>
  <Owner ownerId="3000165">
    <type>1</type>
    <name>The Vanguard Group, Inc.</name>
    <quantity asofDate="2024-03-31">1341230222</quantity>
    <currency>USD</currency>
  </Owner>
  <Owner ownerId="3000123">
    <type>1</type>
    <name>BlackRock Institutional Trust Company, N.A.</name>
    <quantity asofDate="2024-03-31">1021301121</quantity>
    <currency>USD</currency>
  </Owner>
  <Owner ownerId="4410087">
    <type>3</type>
    <name>Cook (Timothy D)</name>
    <quantity asofDate="2023-12-31">3280180</quantity>
    <pctHeld asofDate="2024-01-15">0.02</pctHeld>
  </Owner>
</OwnershipSnapshot>"#;

pub const FIN_SUMMARY_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<FinancialSummary>
  <EPSs currency="USD">
    <EPS asofDate="2024-03-30" reportType="R" period="3M">1.53</EPS>
    <EPS asofDate="2024-03-30" reportType="TTM" period="12M">6.43</EPS>
    <EPS asofDate="2023-12-30" reportType="R" period="3M">2.18</EPS>
    <EPS asofDate="2023-09-30" reportType="A" period="12M">6.13</EPS>
    <EPS asofDate="2024-06-29" reportType="P" period="3M">1.40</EPS>
  </EPSs>
  <DividendPerShares currency="USD">
    <DividendPerShare asofDate="2024-03-30" reportType="R" period="3M">0.24</DividendPerShare>
    <DividendPerShare asofDate="2024-03-30" reportType="TTM" period="12M">0.96</DividendPerShare>
    <DividendPerShare asofDate="2023-12-30" reportType="R" period="3M">0.24</DividendPerShare>
  </DividendPerShares>
  <TotalRevenues currency="USD">
    <TotalRevenue asofDate="2024-03-30" reportType="R" period="3M">90753000000.0</TotalRevenue>
    <TotalRevenue asofDate="2024-03-30" reportType="TTM" period="12M">381623000000.0</TotalRevenue>
    <TotalRevenue asofDate="2023-12-30" reportType="R" period="3M">119575000000.0</TotalRevenue>
    <TotalRevenue asofDate="2023-09-30" reportType="A" period="12M">383285000000.0</TotalRevenue>
  </TotalRevenues>
  <Dividends currency="USD">
    <Dividend type="CD" exDate="2024-05-10" recordDate="2024-05-13" payDate="2024-05-16" declarationDate="2024-05-02">0.25</Dividend>
    <Dividend type="CD" exDate="2024-02-09" recordDate="2024-02-12" payDate="2024-02-15" declarationDate="2024-02-01">0.24</Dividend>
    <Dividend type="CD" exDate="2024-08-12" recordDate="" payDate="" declarationDate="2024-08-01"></Dividend>
  </Dividends>
</FinancialSummary>"#;

pub const SNAPSHOT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ReportSnapshot Major="1" Minor="0" Revision="1">
  <CoIDs>
    <CoID Type="CompanyName">Apple Inc.</CoID>
  </CoIDs>
  <Ratios PriceCurrency="USD" ReportingCurrency="USD" ExchangeRate="1.00000" LatestAvailableDate="2023-09-30">
    <Group ID="Price and Volume">
      <Ratio FieldName="NPRICE" Type="N">189.9800</Ratio>
      <Ratio FieldName="NHIG" Type="N">199.6200</Ratio>
      <Ratio FieldName="PDATE" Type="D">2024-05-10T00:00:00</Ratio>
      <Ratio FieldName="VOL10DAVG" Type="N">63.33778</Ratio>
    </Group>
    <Group ID="Income Statement">
      <Ratio FieldName="TTMREV" Type="N">381623.00000</Ratio>
      <Ratio FieldName="EMPLOYEES">161000</Ratio>
    </Group>
  </Ratios>
  <ForecastData ConsensusType="Mean" CurFiscalYear="2024" CurFiscalYearEndMonth="9" CurInterimEndCalYear="2024" CurInterimEndMonth="6" EarningsBasis="PRX">
    <Ratio FieldName="ConsRecom" Type="N">
      <Value PeriodType="CURR">1.9130</Value>
    </Ratio>
    <Ratio FieldName="TargetPrice" Type="N">
      <Value PeriodType="CURR">202.78261</Value>
    </Ratio>
    <Ratio FieldName="ProjLTGrowthRate" Type="N">
      <Value PeriodType="CURR">9.06000</Value>
    </Ratio>
    <Ratio FieldName="ProjEPSQ" Type="N">
      <Value PeriodType="CURR">1.34690</Value>
    </Ratio>
    <Ratio FieldName="ProjSalesQ" Type="N">
      <Value PeriodType="CURR">84461.34000</Value>
    </Ratio>
  </ForecastData>
</ReportSnapshot>"#;

pub const RESC_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<REarnEstCons Major="1" Minor="0" Revision="1">
  <Company>
    <SecurityInfo>
      <Security code="1"><SecIds><SecId type="ISIN">US0378331005</SecId></SecIds></Security>
    </SecurityInfo>
  </Company>
  <Actuals>
    <FYActuals>
      <FYActual type="EPS" unit="U">
        <FYPeriod periodType="A" fYear="2023" endMonth="9" endCalYear="2023">
          <ActValue updated="2023-11-02T20:30:12">6.13</ActValue>
        </FYPeriod>
        <FYPeriod periodType="Q" fYear="2024" endMonth="3" endCalYear="2024">
          <ActValue updated="2024-05-02T20:30:00">1.53</ActValue>
        </FYPeriod>
      </FYActual>
    </FYActuals>
  </Actuals>
  <ConsEstimates>
    <FYEstimates>
      <FYEstimate type="EPS" unit="U">
        <FYPeriod periodType="A" fYear="2024" endMonth="9" endCalYear="2024">
          <ConsEstimate type="High">
            <ConsValue dateType="CURR">6.91</ConsValue>
            <ConsValue dateType="1WA">6.90</ConsValue>
          </ConsEstimate>
          <ConsEstimate type="Mean">
            <ConsValue dateType="CURR">6.58</ConsValue>
          </ConsEstimate>
        </FYPeriod>
      </FYEstimate>
      <FYEstimate type="Revenue" unit="M">
        <FYPeriod periodType="A" fYear="2024" endMonth="9" endCalYear="2024">
          <ConsEstimate type="NumOfEst">
            <ConsValue dateType="CURR">38</ConsValue>
          </ConsEstimate>
        </FYPeriod>
      </FYEstimate>
    </FYEstimates>
  </ConsEstimates>
</REarnEstCons>"#;

/// A bundle carrying all four sample reports.
pub fn full_bundle() -> DocumentBundle {
  DocumentBundle::new()
    .with_xml(FundamentalReportType::ReportsOwnership, OWNERSHIP_XML)
    .and_then(|b| b.with_xml(FundamentalReportType::ReportsFinSummary, FIN_SUMMARY_XML))
    .and_then(|b| b.with_xml(FundamentalReportType::ReportSnapshot, SNAPSHOT_XML))
    .and_then(|b| b.with_xml(FundamentalReportType::RESC, RESC_XML))
    .expect("fixture documents parse")
}

/// A bundle holding a single document.
pub fn bundle_with(kind: FundamentalReportType, xml: &str) -> DocumentBundle {
  DocumentBundle::new().with_xml(kind, xml).expect("fixture document parses")
}
