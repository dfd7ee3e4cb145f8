// Geodesy
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// Default map position (Seoul City Hall)
pub const DEFAULT_CENTER_LAT: f64 = 37.5665;
pub const DEFAULT_CENTER_LNG: f64 = 126.9780;

// Map zoom levels (smaller is closer)
pub const INITIAL_ZOOM_LEVEL: u8 = 8;
pub const LOCATION_FIX_ZOOM_LEVEL: u8 = 6;
pub const SEARCH_ZOOM_LEVEL: u8 = 4;

// Radius query
pub const DEFAULT_RADIUS_KM: f64 = 2.0;
pub const RADIUS_PRESETS_KM: [f64; 5] = [0.5, 1.0, 2.0, 3.0, 5.0];

// Grid index
pub const DEFAULT_GRID_CELL_DEG: f64 = 0.01;         // roughly 1.1km of latitude

// Popups
pub const HIGHLIGHT_DISMISS_SECS: u64 = 10;

// Dataset field names
pub const FIELD_LAT: &str = "WGS84위도";
pub const FIELD_LNG: &str = "WGS84경도";
pub const FIELD_PURPOSE: &str = "설치목적";
pub const FIELD_LOCATION_NAME: &str = "설치위치";
pub const FIELD_SITE_TYPE: &str = "설치장소유형";
pub const FIELD_ROAD_ADDRESS: &str = "소재지도로명주소";
pub const FIELD_LOT_ADDRESS: &str = "소재지지번주소";
pub const FIELD_AUTHORITY: &str = "관리기관명";
pub const FIELD_AUTHORITY_PHONE: &str = "관리기관전화번호";

// Known installation purposes
pub const PURPOSE_CRIME_PREVENTION: &str = "방범용";
pub const PURPOSE_VULNERABLE_PROTECTION: &str = "약자보호";

// Bucket for records without a value in stats
pub const STATS_OTHER_KEY: &str = "기타";

// Presentation
pub const MISSING_VALUE_TEXT: &str = "N/A";
pub const COLOR_CRIME_PREVENTION: &str = "#ff4757";
pub const COLOR_VULNERABLE_PROTECTION: &str = "#2ed573";
pub const COLOR_OTHER: &str = "#ffa502";
pub const COLOR_USER_LOCATION: &str = "#007bff";
pub const COLOR_RADIUS_CIRCLE: &str = "#667eea";
pub const MARKER_SIZE_PX: u32 = 30;
pub const HIGHLIGHT_MARKER_SIZE_PX: u32 = 40;
