//! Task descriptions and expected outputs

use agent_prompt::{PromptTemplate, Result};

pub fn price_trend() -> Result<Vec<PromptTemplate>> {
    Ok(vec![
        PromptTemplate::new(
            "price_trend.task",
            r"Analyze the {{ ticker }} stock price history from {{ window }} and create an up, down or sideways trend analysis.
{% if price_summary %}
Price history summary:
{{ price_summary }}

The daily rows are available through the {{ price_tool }} tool.
{% endif %}",
        )?,
        PromptTemplate::new(
            "price_trend.expected",
            "Specify the current trend of the stock price: up, down or sideways. \
             Start with a line exactly in the form '{{ ticker }}, price UP', '{{ ticker }}, price DOWN' \
             or '{{ ticker }}, price SIDEWAYS', then give a short rationale.",
        )?,
    ])
}

pub fn news_sentiment() -> Result<Vec<PromptTemplate>> {
    Ok(vec![
        PromptTemplate::new(
            "news_sentiment.task",
            r"Analyze the latest news for these assets: {{ assets | join(', ') }}. {{ reference_asset }} is always included, even if not requested.
Use the {{ news_tool }} tool to search for each asset individually.
The current date is {{ current_date }}.
Compose the results into a useful report. When a search finds no news for an asset, do not guess: write '{{ insufficient }}' as its summary and N/A as its forecast and score.",
        )?,
        PromptTemplate::new(
            "news_sentiment.expected",
            r"A one-sentence summary of the overall market and a one-sentence summary for each asset requested, with a fear/positivity score for each asset based on the news. Use exactly this format:

MARKET: <overall market summary>
{% for asset in assets %}
ASSET: {{ asset }}
SUMMARY: <news-based summary>
FORECAST: <UP, DOWN or SIDEWAYS>
SCORE: <0 to 100, where 0 is extreme fear and 100 is extreme positivity>
{% endfor %}",
        )?,
    ])
}

pub fn newsletter() -> Result<Vec<PromptTemplate>> {
    Ok(vec![
        PromptTemplate::new(
            "newsletter.task",
            "Use the stock price trend and the stock news report to write a company newsletter about \
             {{ ticker }}. Keep it brief and highlight the most important points. Focus on the stock \
             price trend, the news and the fear/positivity scores. What are the considerations for the \
             near future? Include the previous trend analysis and news summary.",
        )?,
        PromptTemplate::new(
            "newsletter.expected",
            r"An eloquent newsletter formatted as markdown in an easy-to-read manner, under a '# ' title, with exactly these four sections as '## ' headings, each used once:
## Executive Summary - exactly 3 bullet points
## Introduction - set the big picture and increase interest
## Main Analysis - the gist of the analysis, including the news summary and the fear/positivity scores of {{ assets | join(', ') }}
## Conclusion - important facts and a concrete prediction, ending with the line 'Prediction: UP', 'Prediction: DOWN' or 'Prediction: SIDEWAYS'",
        )?,
    ])
}
