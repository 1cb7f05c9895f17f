use super::{Cell, Column, RowKey, Tabular};

record_schema! {
    /// One row of the stock-screener export.
    ///
    /// `composite_figi` is empty until enrichment finds the ticker in the
    /// reference snapshot; `event_date` is the externally supplied report date.
    /// Numeric cells that the export marked `"NA"` arrive as zero.
    pub struct ScreenerRecord in SCREENER_COLUMNS {
        company_name: Text = "Company Name",
        ticker: Text = "Ticker",
        composite_figi: Text,
        exchange: Text = "Exchange",
        event_date: Date,
        in_sp500: Bool = "S&P 500 - ETF",
        last_close: Double = "Last Close",
        month_of_fiscal_yr_end: Int = "Month of Fiscal Yr End",
        optionable: Bool = "Optionable",
        sector: Text = "Sector",
        industry: Text = "Industry",
        shares_outstanding_mil: Double = "Shares Outstanding (mil)",
        market_cap_mil: Double = "Market Cap (mil)",
        avg_volume: BigInt = "Avg Volume",
        wk_high_52: Double = "52 Week High",
        wk_low_52: Double = "52 Week Low",
        price_as_percent_of_52wk_hl: Float = "Price as a % of 52 Wk H-L Range",
        beta: Float = "Beta",
        percent_price_change_1wk: Float = "% Price Change (1 Week)",
        percent_price_change_4wk: Float = "% Price Change (4 Weeks)",
        percent_price_change_12wk: Float = "% Price Change (12 Weeks)",
        percent_price_change_ytd: Float = "% Price Change (YTD)",
        relative_price_change: Float = "Relative Price Change",
        zacks_rank: Int = "Zacks Rank",
        zacks_rank_change_indicator: Int = "Zacks Rank Change Indicator",
        zacks_industry_rank: Int = "Zacks Industry Rank",
        value_score: Text = "Value Score",
        growth_score: Text = "Growth Score",
        momentum_score: Text = "Momentum Score",
        vgm_score: Text = "VGM Score",
        current_avg_broker_rec: Float = "Current Avg Broker Rec",
        num_brokers_in_rating: Int = "# of Brokers in Rating",
        num_rating_strong_buy_or_buy: Int = "# Rating Strong Buy or Buy",
        percent_rating_strong_buy_or_buy: Float = "% Rating Strong Buy or Buy",
        num_rating_hold: Int = "# Rating Hold",
        num_rating_strong_sell_or_sell: Int = "# Rating Strong Sell or Sell",
        percent_rating_strong_sell_or_sell: Float = "% Rating Strong Sell or Sell",
        percent_rating_change_4wk: Float = "% Rating Change - 4 Weeks",
        industry_rank_of_abr: Int = "Industry Rank (of ABR)",
        rank_in_industry_of_abr: Int = "Rank in Industry (of ABR)",
        change_in_avg_rec: Float = "Change in Avg Rec ",
        number_rating_upgrades: Int = "# Rating Upgrades",
        number_rating_downgrades: Int = "# Rating Downgrades ",
        percent_rating_hold: Float = "% Rating Hold",
        percent_rating_upgrades: Float = "% Rating Upgrades ",
        percent_rating_downgrades: Float = "% Rating Downgrades ",
        average_target_price: Double = "Average Target Price",
        earnings_esp: Float = "Earnings ESP",
        last_eps_surprise_percent: Float = "Last EPS Surprise (%)",
        previous_eps_surprise_percent: Float = "Previous EPS Surprise (%)",
        avg_eps_surprise_last_4_qtrs: Float = "Avg EPS Surprise (Last 4 Qtrs)",
        actual_eps_used_in_surprise_dollars_per_share: Float = "Actual EPS used in Surprise ($/sh)",
        last_qtr_eps: Float = "Last Qtr EPS",
        last_reported_qtr_date: MonthLabel = "Last Reported Qtr (yyyymm)",
        last_yr_eps_f0_before_nri: Float = "Last Yr's EPS (F0) Before NRI",
        twelve_mo_trailing_eps: Float = "12 Mo Trailing EPS",
        last_reported_fiscal_yr: MonthLabel = "Last Reported Fiscal Yr  (yyyymm)",
        last_eps_report_date: DayLabel = "Last EPS Report Date (yyyymmdd)",
        next_eps_report_date: DayLabel = "Next EPS Report Date  (yyyymmdd)",
        percent_change_q0_est: Float = "% Change Q0 Est. (4 weeks)",
        percent_change_q2_est: Float = "% Change Q2 Est. (4 weeks)",
        percent_change_f1_est: Float = "% Change F1 Est. (4 weeks)",
        percent_change_q1_est: Float = "% Change Q1 Est. (4 weeks)",
        percent_change_f2_est: Float = "% Change F2 Est. (4 weeks)",
        percent_change_lt_growth_est: Float = "% Change LT Growth Est. (4 weeks)",
        q0_consensus_est_last_completed_fiscal_qtr: Float = "Q0 Consensus Est. (last completed fiscal Qtr)",
        number_of_analysts_in_q0_consensus: Int = "# of Analysts in Q0 Consensus",
        q1_consensus_est: Float = "Q1 Consensus Est. ",
        number_of_analysts_in_q1_consensus: Int = "# of Analysts in Q1 Consensus",
        stdev_q1_q1_consensus_ratio: Float = "St. Dev. Q1 / Q1 Consensus",
        q2_consensus_est_next_fiscal_qtr: Float = "Q2 Consensus Est. (next fiscal Qtr)",
        number_of_analysts_in_q2_consensus: Int = "# of Analysts in Q2 Consensus",
        stdev_q2_q2_consensus_ratio: Float = "St. Dev. Q2 / Q2 Consensus",
        f0_consensus_est: Float = "F0 Consensus Est.",
        number_of_analysts_in_f0_consensus: Float = "# of Analysts in F0 Consensus",
        f1_consensus_est: Float = "F1 Consensus Est.",
        number_of_analysts_in_f1_consensus: Int = "# of Analysts in F1 Consensus",
        stdev_f1_f1_consensus_ratio: Float = "St. Dev. F1 / F1 Consensus",
        f2_consensus_est: Float = "F2 Consensus Est.",
        number_of_analysts_in_f2_consensus: Int = "# of Analysts in F2 Consensus",
        five_yr_hist_eps_growth: Float = "5 Yr. Hist. EPS Growth",
        long_term_growth_consensus_est: Float = "Long-Term Growth Consensus Est.",
        percent_change_eps: Float = "% Change EPS (F(-1)/F(-2))",
        last_yrs_growth: Float = "Last Yrs Growth (F[0] / F [-1])",
        this_yrs_est_growth: Float = "This Yr's Est.d Growth (F(1)/F(0))",
        percent_ratio_of_q1_q0: Float = "% Ratio of Q1/Q0",
        percent_ratio_of_q1_prior_yr_q1_actual_q: Float = "% Ratio of Q1/prior Yr Q1 Actual Q(-3)",
        sales_growth: Float = "Sales Growth F(0)/F(-1)",
        five_yr_historical_sales_growth: Float = "5 Yr Historical Sales Growth",
        q1_consensus_sales_est_mil: Float = "Q(1) Consensus Sales Est. ($mil)",
        f1_consensus_sales_est_mil: Float = "F(1) Consensus Sales Est. ($mil)",
        pe_trailing_12_months: Float = "P/E (Trailing 12 Months)",
        pe_f1: Float = "P/E (F1)",
        pe_f2: Float = "P/E (F2)",
        peg_ratio: Float = "PEG Ratio",
        price_to_cash_flow: Float = "Price/Cash Flow",
        price_to_sales: Float = "Price/Sales",
        price_to_book: Float = "Price/Book",
        current_roe_ttm: Float = "Current ROE (TTM)",
        current_roi_ttm: Float = "Current ROI (TTM)",
        roi_5_yr_avg: Float = "ROI (5 Yr Avg)",
        current_roa_ttm: Float = "Current ROA (TTM)",
        roa_5_yr_avg: Float = "ROA (5 Yr Avg)",
        market_value_to_number_analysts: Float = "Market Value/# Analysts",
        annual_sales_mil: Float = "Annual Sales ($mil)",
        cost_of_goods_sold_mil: Float = "Cost of Goods Sold ($mil)",
        ebitda_mil: Float = "EBITDA ($mil)",
        ebit_mil: Float = "EBIT ($mil)",
        pretax_income_mil: Float = "Pretax Income ($mil)",
        net_income_mil: Float = "Net Income  ($mil)",
        cash_flow_mil: Float = "Cash Flow ($mil)",
        net_income_growth_f0_f_neg1: Float = "Net Income Growth F(0)/F(-1)",
        twelve_mo_net_income_current_to_last_percent: Float = "12 Mo. Net Income Current/Last %",
        twelve_mo_net_income_current_1q_to_last_1q_percent: Float = "12 Mo. Net Income Current-1Q/Last-1Q %",
        div_yield_percent: Float = "Div. Yield %",
        five_yr_div_yield_percent: Float = "5 Yr Div. Yield %",
        five_yr_hist_div_growth_percent: Float = "5 Yr Hist. Div. Growth %",
        dividend: Float = "Dividend ",
        net_margin_percent: Float = "Net Margin %",
        turnover: Float = "Turnover",
        operating_margin_12_mo_percent: Float = "Operating Margin 12 Mo %",
        inventory_turnover: Float = "Inventory Turnover",
        asset_utilization: Float = "Asset Utilization",
        receivables_mil: Float = "Receivables ($mil)",
        intangibles_mil: Float = "Intangibles ($mil)",
        inventory_mil: Float = "Inventory ($mil)",
        current_assets_mil: Float = "Current Assets  ($mil)",
        current_liabilities_mil: Float = "Current Liabilities ($mil)",
        long_term_debt_mil: Float = "Long Term Debt ($mil)",
        preferred_equity_mil: Float = "Preferred Equity ($mil)",
        common_equity_mil: Float = "Common Equity ($mil)",
        book_value: Float = "Book Value",
        debt_to_total_capital: Float = "Debt/Total Capital",
        debt_to_equity_ratio: Float = "Debt/Equity Ratio",
        current_ratio: Float = "Current Ratio",
        quick_ratio: Float = "Quick Ratio",
        cash_ratio: Float = "Cash Ratio",
    }
}

impl Tabular for ScreenerRecord {
    fn columns() -> &'static [Column] {
        SCREENER_COLUMNS
    }

    fn cells(&self) -> Vec<Cell<'_>> {
        self.schema_cells()
    }

    fn row_key(&self) -> RowKey<'_> {
        RowKey {
            ticker: &self.ticker,
            composite_figi: &self.composite_figi,
            period: self
                .event_date
                .map(|date| date.to_string())
                .unwrap_or_default(),
        }
    }
}
