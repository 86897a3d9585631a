// LLM-friendly documentation endpoint content.

pub const LLMS_TXT: &str = r#"# Rugby Coach API
> Submit a rugby player's physical profile and receive markdown coaching advice.

## API Base URL
/api/

## Key Endpoints
- GET /api/hello - Greeting message
- GET /api/test-cors - Returns the allowed frontend origin
- POST /api/echo - Echoes any JSON body back as receivedData
- POST /api/players - Analyze a player profile

## Player Profile
POST /api/players with Content-Type: application/json
{"age": 25, "position": "Prop", "weight": 110, "height": 185, "description": "optional"}

Positions: Prop, Hooker, Lock, Flanker, Number 8, Scrum-half, Fly-half, Center, Wing, Full-back
Weight is in kilograms, height in centimeters.

## Responses
- 201 {"success": true, "message": ..., "analysis": ..., "source": "model"}
- 201 {"success": true, "message": ..., "analysis": ..., "source": "fallback", "openaiError": ...}
  when the language model is unavailable; the analysis is a fixed template.
- 400 {"error": "All fields are required"} when age, position, weight or height is missing.
- 400 {"error": "Invalid player data", "details": ...} when a field cannot be decoded.

## Operations
- GET /health - Liveness check
- GET /metrics - Prometheus metrics
"#;
