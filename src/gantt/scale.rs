use chrono::{Duration, NaiveDate};

/// Timeline zoom level — how many terminal cells one day occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zoom {
    Day,
    Week,
    Month,
}

impl Zoom {
    pub fn cell_width(self) -> u16 {
        match self {
            Zoom::Day => 4,
            Zoom::Week => 2,
            Zoom::Month => 1,
        }
    }

    pub fn zoom_in(self) -> Zoom {
        match self {
            Zoom::Month => Zoom::Week,
            _ => Zoom::Day,
        }
    }

    pub fn zoom_out(self) -> Zoom {
        match self {
            Zoom::Day => Zoom::Week,
            _ => Zoom::Month,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Zoom::Day => "day",
            Zoom::Week => "week",
            Zoom::Month => "month",
        }
    }

    pub fn from_name(name: &str) -> Option<Zoom> {
        match name {
            "day" => Some(Zoom::Day),
            "week" => Some(Zoom::Week),
            "month" => Some(Zoom::Month),
            _ => None,
        }
    }
}

/// Maps dates to horizontal cell positions and back. The cell width is
/// injected (from the zoom level), so all drag math is independent of
/// the rendering surface.
#[derive(Debug, Clone, Copy)]
pub struct TimeScale {
    pub origin: NaiveDate,
    pub cell_width: u16,
}

impl TimeScale {
    pub fn new(origin: NaiveDate, zoom: Zoom) -> Self {
        TimeScale {
            origin,
            cell_width: zoom.cell_width(),
        }
    }

    /// Cell x of a date (can be negative, left of the origin)
    pub fn x_of(&self, date: NaiveDate) -> i64 {
        (date - self.origin).num_days() * self.cell_width as i64
    }

    /// The date whose column contains cell x
    pub fn date_at(&self, x: i64) -> NaiveDate {
        let days = x.div_euclid(self.cell_width as i64);
        self.origin + Duration::days(days)
    }

    /// Horizontal displacement in whole days, snapped to the nearest
    /// day boundary (round, not floor, so small jitters don't drift).
    pub fn delta_days(&self, dx: i64) -> i64 {
        (dx as f64 / self.cell_width as f64).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn x_of_and_date_at_are_inverse_on_boundaries() {
        let scale = TimeScale::new(date("2026-01-01"), Zoom::Day);
        let d = date("2026-01-15");
        assert_eq!(scale.x_of(d), 14 * 4);
        assert_eq!(scale.date_at(scale.x_of(d)), d);
        assert_eq!(scale.date_at(scale.x_of(d) + 3), d); // inside the column
    }

    #[test]
    fn dates_before_origin_map_left() {
        let scale = TimeScale::new(date("2026-01-10"), Zoom::Week);
        assert_eq!(scale.x_of(date("2026-01-08")), -4);
        assert_eq!(scale.date_at(-4), date("2026-01-08"));
        assert_eq!(scale.date_at(-1), date("2026-01-09"));
    }

    #[test]
    fn delta_days_snaps_to_nearest() {
        let scale = TimeScale::new(date("2026-01-01"), Zoom::Day); // 4 cells/day
        assert_eq!(scale.delta_days(0), 0);
        assert_eq!(scale.delta_days(1), 0); // 0.25 day
        assert_eq!(scale.delta_days(2), 1); // 0.5 rounds up
        assert_eq!(scale.delta_days(5), 1);
        assert_eq!(scale.delta_days(6), 2);
        assert_eq!(scale.delta_days(-6), -2); // symmetric
        assert_eq!(scale.delta_days(-1), 0);
    }

    #[test]
    fn zoom_steps() {
        assert_eq!(Zoom::Month.zoom_in(), Zoom::Week);
        assert_eq!(Zoom::Week.zoom_in(), Zoom::Day);
        assert_eq!(Zoom::Day.zoom_out(), Zoom::Week);
        assert_eq!(Zoom::Week.zoom_out(), Zoom::Month);
        assert_eq!(Zoom::from_name("week"), Some(Zoom::Week));
        assert_eq!(Zoom::from_name("year"), None);
    }
}
