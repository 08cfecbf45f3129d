pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const CHECK: &str = "✅";
    pub const WARN: &str = "⚠️";
    pub const STATS: &str = "📊";
    pub const DATABASE: &str = "🗄️";
    pub const MONEY: &str = "💰";
    pub const CHART: &str = "📈";
    pub const BRIEFCASE: &str = "💼";
    pub const WRENCH: &str = "🔧";
}
