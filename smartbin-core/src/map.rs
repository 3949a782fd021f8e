//! One-way projection of bins, route, and vehicle position onto map layers.
//!
//! The layers are plain data; a front end draws them however it likes.

use tracing::warn;

use crate::model::{Bin, BinId, Coordinate, RouteStop, WasteCategory};

/// Priority above which markers are drawn larger.
pub const LARGE_MARKER_PRIORITY: f64 = 0.7;
/// Priority above which markers pulse.
pub const PULSING_MARKER_PRIORITY: f64 = 0.8;
/// Padding around an optimized route, as a fraction of its extent.
pub const ROUTE_FIT_PADDING: f64 = 0.1;
/// Padding around a direct navigation line; wider than the route view.
pub const DIRECT_FIT_PADDING: f64 = 0.25;
/// Smallest extent of a fitted view in degrees, so a lone point is not a zero-size box.
pub const MIN_VIEW_SPAN: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Marker size class.
pub enum MarkerSize {
    /// Default marker.
    Regular,
    /// High priority marker.
    Large,
}

#[derive(Debug, Clone, PartialEq)]
/// One marker per bin.
pub struct BinMarker {
    /// Bin the marker stands for.
    pub bin_id: BinId,
    /// Marker position.
    pub position: Coordinate,
    /// Category, which keys the marker color.
    pub category: WasteCategory,
    /// Size class.
    pub size: MarkerSize,
    /// Whether the marker pulses.
    pub pulsing: bool,
    /// Popup text.
    pub popup: String,
}

impl BinMarker {
    fn for_bin(bin: &Bin, position: Coordinate) -> Self {
        let size = if bin.priority_score > LARGE_MARKER_PRIORITY {
            MarkerSize::Large
        } else {
            MarkerSize::Regular
        };
        Self {
            bin_id: bin.id.clone(),
            position,
            category: bin.category,
            size,
            pulsing: bin.priority_score > PULSING_MARKER_PRIORITY,
            popup: format!(
                "{} · {} · {:.0}% · priority {:.2}",
                bin.id,
                bin.location,
                bin.fill_level,
                bin.priority_score
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Numbered marker for a route stop.
pub struct StopMarker {
    /// Stop number, 1-based.
    pub number: u32,
    /// Bin collected there.
    pub bin_id: BinId,
    /// Stop position.
    pub position: Coordinate,
}

#[derive(Debug, Clone, PartialEq)]
/// Optimized route polyline with its stop markers.
pub struct RouteLayer {
    /// Current position followed by every stop, in order.
    pub polyline: Vec<Coordinate>,
    /// Numbered stop markers.
    pub stops: Vec<StopMarker>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Dashed line from the vehicle to a navigation target.
pub struct DirectRouteLayer {
    /// Where navigation started.
    pub from: Coordinate,
    /// Navigation target.
    pub to: Coordinate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Visible geographic box.
pub struct Viewport {
    /// Southern edge (min latitude).
    pub south: f64,
    /// Western edge (min longitude).
    pub west: f64,
    /// Northern edge (max latitude).
    pub north: f64,
    /// Eastern edge (max longitude).
    pub east: f64,
}

impl Viewport {
    /// Box around `points` with `padding` of the extent added on every side.
    ///
    /// Returns `None` for an empty point set.
    #[must_use]
    pub fn fit(points: &[Coordinate], padding: f64) -> Option<Self> {
        let first = points.first()?;
        let mut view = Self {
            south: first.lat,
            west: first.lng,
            north: first.lat,
            east: first.lng,
        };
        for point in points {
            view.south = view.south.min(point.lat);
            view.north = view.north.max(point.lat);
            view.west = view.west.min(point.lng);
            view.east = view.east.max(point.lng);
        }

        let lat_pad = (view.north - view.south).max(MIN_VIEW_SPAN) * padding;
        let lng_pad = (view.east - view.west).max(MIN_VIEW_SPAN) * padding;
        view.south -= lat_pad;
        view.north += lat_pad;
        view.west -= lng_pad;
        view.east += lng_pad;
        Some(view)
    }

    /// Whether `point` lies inside the box.
    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        (self.south..=self.north).contains(&point.lat) && (self.west..=self.east).contains(&point.lng)
    }
}

/// Map layers kept in sync with the registry, route, and simulated position.
#[derive(Debug, Clone)]
pub struct MapLayers {
    current_location: Coordinate,
    markers: Vec<BinMarker>,
    route: Option<RouteLayer>,
    direct_route: Option<DirectRouteLayer>,
    viewport: Option<Viewport>,
    popup: Option<BinId>,
}

impl MapLayers {
    /// Empty map with the vehicle at `current_location`.
    #[must_use]
    pub fn new(current_location: Coordinate) -> Self {
        Self {
            current_location,
            markers: Vec::new(),
            route: None,
            direct_route: None,
            viewport: None,
            popup: None,
        }
    }

    /// Redraw every bin marker; bins without usable coordinates are skipped.
    pub fn sync_bins<'a>(&mut self, bins: impl IntoIterator<Item = &'a Bin>) {
        self.markers = bins
            .into_iter()
            .filter_map(|bin| bin.position().map(|position| BinMarker::for_bin(bin, position)))
            .collect();
        if self.viewport.is_none() {
            let mut points: Vec<Coordinate> =
                self.markers.iter().map(|marker| marker.position).collect();
            points.push(self.current_location);
            self.viewport = Viewport::fit(&points, ROUTE_FIT_PADDING);
        }
    }

    /// Replace the route layer.
    ///
    /// The polyline runs from the current position through each stop with
    /// coordinates. Fewer than two points leave the map without a route.
    pub fn draw_route(&mut self, stops: &[RouteStop]) {
        self.route = None;

        let mut polyline = vec![self.current_location];
        let mut markers = Vec::with_capacity(stops.len());
        for stop in stops {
            let Some(position) = stop.coordinates.filter(Coordinate::is_valid) else {
                warn!(bin_id = %stop.bin_id, "route stop without coordinates skipped");
                continue;
            };
            polyline.push(position);
            markers.push(StopMarker {
                number: stop.stop_number,
                bin_id: stop.bin_id.clone(),
                position,
            });
        }

        if polyline.len() < 2 {
            return;
        }
        self.viewport = Viewport::fit(&polyline, ROUTE_FIT_PADDING);
        self.route = Some(RouteLayer {
            polyline,
            stops: markers,
        });
    }

    /// Remove the route layer.
    pub fn clear_route(&mut self) {
        self.route = None;
    }

    /// Show the dashed line toward a navigation target and fit the view to it.
    pub fn show_direct_route(&mut self, to: Coordinate) {
        let from = self.current_location;
        self.viewport = Viewport::fit(&[from, to], DIRECT_FIT_PADDING);
        self.direct_route = Some(DirectRouteLayer { from, to });
    }

    /// Remove the direct navigation line.
    pub fn clear_direct_route(&mut self) {
        self.direct_route = None;
    }

    /// Move the vehicle marker; other layers are left alone.
    pub fn move_current_location(&mut self, position: Coordinate) {
        self.current_location = position;
    }

    /// Open the popup of one bin marker, or close it.
    pub fn show_popup(&mut self, bin: Option<&BinId>) {
        self.popup = bin.cloned();
    }

    /// Vehicle position.
    #[must_use]
    pub fn current_location(&self) -> Coordinate {
        self.current_location
    }

    /// Bin markers.
    #[must_use]
    pub fn markers(&self) -> &[BinMarker] {
        &self.markers
    }

    /// Route layer, when a route is shown.
    #[must_use]
    pub fn route(&self) -> Option<&RouteLayer> {
        self.route.as_ref()
    }

    /// Direct navigation line, when navigating.
    #[must_use]
    pub fn direct_route(&self) -> Option<&DirectRouteLayer> {
        self.direct_route.as_ref()
    }

    /// Fitted view, once anything has been drawn.
    #[must_use]
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Marker whose popup is open.
    #[must_use]
    pub fn popup(&self) -> Option<&BinMarker> {
        let id = self.popup.as_ref()?;
        self.markers.iter().find(|marker| &marker.bin_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BinStatus, SensorReadings};

    fn bin(id: &str, priority_score: f64, coordinates: Option<Coordinate>) -> Bin {
        Bin {
            id: BinId::from(id),
            location: "Somewhere".to_owned(),
            address: None,
            coordinates,
            category: WasteCategory::Recyclable,
            fill_level: 40.0,
            priority_score,
            status: BinStatus::Normal,
            sensors: SensorReadings::default(),
            hazard_score: None,
            predicted_full: None,
            last_update: None,
        }
    }

    fn stop(number: u32, coordinates: Option<Coordinate>) -> RouteStop {
        RouteStop {
            stop_number: number,
            bin_id: BinId(format!("BIN{number:03}")),
            location: "Stop".to_owned(),
            coordinates,
            category: WasteCategory::General,
            fill_level: 80.0,
            priority_score: 0.6,
            distance_from_previous_km: 2.3,
            travel_time_minutes: 6,
            collection_time_minutes: 15,
            estimated_arrival: None,
            predicted_fill_on_arrival: None,
        }
    }

    #[test]
    fn marker_size_and_pulse_follow_priority() {
        let mut map = MapLayers::new(Coordinate::new(40.7, -74.0));
        let here = Some(Coordinate::new(40.75, -73.99));
        map.sync_bins(&[bin("low", 0.5, here), bin("mid", 0.75, here), bin("top", 0.85, here)]);

        let styles: Vec<_> = map
            .markers()
            .iter()
            .map(|marker| (marker.size, marker.pulsing))
            .collect();
        assert_eq!(
            styles,
            [
                (MarkerSize::Regular, false),
                (MarkerSize::Large, false),
                (MarkerSize::Large, true),
            ]
        );
    }

    #[test]
    fn sync_skips_bins_without_coordinates() {
        let mut map = MapLayers::new(Coordinate::new(40.7, -74.0));
        map.sync_bins(&[bin("A", 0.5, None), bin("B", 0.5, Some(Coordinate::new(40.8, -74.1)))]);
        assert_eq!(map.markers().len(), 1);
    }

    #[test]
    fn route_without_stops_draws_nothing() {
        let mut map = MapLayers::new(Coordinate::new(40.7, -74.0));
        map.draw_route(&[]);
        assert!(map.route().is_none());

        map.draw_route(&[stop(1, None)]);
        assert!(map.route().is_none(), "stops without coordinates do not count");
    }

    #[test]
    fn route_starts_at_current_location_and_fits_view() {
        let origin = Coordinate::new(40.7128, -74.006);
        let mut map = MapLayers::new(origin);
        let far = Coordinate::new(40.7829, -73.9654);
        map.draw_route(&[stop(1, Some(Coordinate::new(40.75, -73.99))), stop(2, Some(far))]);

        let route = map.route().expect("route drawn");
        assert_eq!(route.polyline.first(), Some(&origin));
        assert_eq!(route.polyline.len(), 3);
        assert_eq!(route.stops.iter().map(|marker| marker.number).collect::<Vec<_>>(), [1, 2]);

        let view = map.viewport().expect("fitted");
        assert!(view.contains(origin) && view.contains(far));
        assert!(view.north > far.lat, "padding added");
    }

    #[test]
    fn new_empty_route_replaces_old_one() {
        let mut map = MapLayers::new(Coordinate::new(40.7, -74.0));
        map.draw_route(&[stop(1, Some(Coordinate::new(40.75, -73.99)))]);
        assert!(map.route().is_some());
        map.draw_route(&[]);
        assert!(map.route().is_none());
    }

    #[test]
    fn direct_route_uses_wider_padding() {
        let from = Coordinate::new(40.0, -74.0);
        let to = Coordinate::new(41.0, -73.0);
        let mut routed = MapLayers::new(from);
        routed.draw_route(&[stop(1, Some(to))]);
        let mut direct = MapLayers::new(from);
        direct.show_direct_route(to);

        let route_view = routed.viewport().expect("route view");
        let direct_view = direct.viewport().expect("direct view");
        assert!(direct_view.north > route_view.north);
        assert!(direct_view.west < route_view.west);
        assert_eq!(direct.direct_route().map(|line| line.to), Some(to));
    }

    #[test]
    fn moving_vehicle_keeps_other_layers() {
        let mut map = MapLayers::new(Coordinate::new(40.0, -74.0));
        map.sync_bins(&[bin("A", 0.5, Some(Coordinate::new(40.8, -74.1)))]);
        map.draw_route(&[stop(1, Some(Coordinate::new(40.75, -73.99)))]);
        let before = map.clone();

        map.move_current_location(Coordinate::new(40.1, -73.9));
        assert_eq!(map.current_location(), Coordinate::new(40.1, -73.9));
        assert_eq!(map.markers(), before.markers());
        assert_eq!(map.route(), before.route());
    }

    #[test]
    fn popup_follows_marker() {
        let mut map = MapLayers::new(Coordinate::new(40.0, -74.0));
        map.sync_bins(&[bin("A", 0.5, Some(Coordinate::new(40.8, -74.1)))]);
        map.show_popup(Some(&BinId::from("A")));
        assert!(map.popup().is_some_and(|marker| marker.popup.contains("Somewhere")));
        map.show_popup(Some(&BinId::from("gone")));
        assert!(map.popup().is_none());
    }
}
