//! Weekly targeting-accuracy query template.

use crate::window::ReportWindow;

/// Render the weekly Hive query for one pixel/profile pair.
///
/// The select list is position-sensitive: results decode into
/// [`crate::engine::QueryResult`] by field order, so the five output
/// columns must stay exactly as they are.
pub fn weekly_query(pixel: &str, profile_id: &str, window: &ReportWindow) -> String {
    format!(
        "\
set hive.execution.engine = tez;
set fs.s3n.block.size=128000000;
set fs.s3a.block.size=128000000;
set hive.exec.reducers.max = 60;

select
x.TOTAL_IMPRESSIONS,
y.ELIGIBLE_INDIVIDUALS,
nvl((round((y.ELIGIBLE_INDIVIDUALS / x.TOTAL_IMPRESSIONS), 4) * 100), 0) as IND_MATCH_PERCENT,
z.MATCHED_INDIVIDUALS,
nvl((round((z.MATCHED_INDIVIDUALS / x.TOTAL_IMPRESSIONS), 4) * 100), 0) as TARGETING_ACCURACY
from
(select 1 as link, count(*) as TOTAL_IMPRESSIONS from core_digital.unified_impression
where data_source_id_part = 6
and source = 'save'
and pixel_id in ({pixel})
and data_date between {start_date} and {end_date}
) x
left join
(
select 1 as link, count(b.individual_id) as ELIGIBLE_INDIVIDUALS
from
(select na_guid_id from core_digital.unified_impression
where data_source_id_part = 6
and source = 'save'
and pixel_id in ({pixel})
and data_date between {start_date} and {end_date}
) a
inner join core_digital.best_matched_cookies_history_ind b
on a.na_guid_id = b.guid
) y on x.link = y.link
left join
(
select 1 as link, count(c.individual_id) as MATCHED_INDIVIDUALS
from
(select na_guid_id from core_digital.unified_impression
where data_source_id_part = 6
and source = 'save'
and pixel_id in ({pixel})
and data_date between {start_date} and {end_date}
) a
inner join core_digital.best_matched_cookies_history_ind b
on a.na_guid_id = b.guid
inner join
(select individual_id from core_shared.individual_segment_values_vw
where segment_id in ({profile_ids})
) c
on c.individual_id = b.individual_id
) z on x.link = z.link
",
        pixel = pixel,
        profile_ids = profile_id,
        start_date = window.start_compact(),
        end_date = window.end_compact(),
    )
}
